use iced::alignment::Horizontal;
use iced::theme;
use iced::widget::{
    button, checkbox, column, container, pick_list, row, scrollable, text, text_input, Space,
};
use iced::{Alignment, Color, Element, Length};

use statusboard_core::{
    now_epoch_seconds, DashboardView, Density, EpochSeconds, Group, ItemState, ItemStatus,
    RefreshInterval, StatusFilter, VisibleItem,
};

use super::styles::{
    error_color, heading_color, level_color, muted_color, BannerStyle, CardStyle,
    MenuTabStyle,
};
use super::{DashboardApp, Message, Tab};
use crate::logging::LogLevel;

impl DashboardApp {
    pub(super) fn root_view(&self) -> Element<'_, Message> {
        let body = match self.active_tab {
            Tab::Dashboard => self.dashboard_view(),
            Tab::Logs => self.logs_view(),
        };

        let content = column![self.header_view(), self.tab_bar(), body]
            .spacing(16)
            .padding(16);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn header_view(&self) -> Element<'_, Message> {
        let state = self.controller.groups_state();
        let mut header = row![text(&self.config.display_name)
            .size(28)
            .style(theme::Text::Color(heading_color()))]
        .spacing(12)
        .align_items(Alignment::Center);

        if let Some(group) = state.selected_group() {
            header = header.push(
                text(format!("{} servers in {}", group.servers.len(), group.name))
                    .size(16)
                    .style(theme::Text::Color(muted_color())),
            );
        }
        if state.loading {
            header = header.push(text("loading...").size(14).style(theme::Text::Color(muted_color())));
        } else if let Some(error) = &state.error {
            header = header.push(
                text(format!("Error: {error}"))
                    .size(14)
                    .style(theme::Text::Color(error_color())),
            );
        }

        header.into()
    }

    fn tab_bar(&self) -> Element<'_, Message> {
        row![
            self.tab_button(Tab::Dashboard, "Dashboard"),
            self.tab_button(Tab::Logs, "Logs")
        ]
        .spacing(8)
        .align_items(Alignment::Center)
        .into()
    }

    fn tab_button(&self, tab: Tab, label: &str) -> Element<'_, Message> {
        let style = if self.active_tab == tab {
            theme::Button::Primary
        } else {
            theme::Button::Secondary
        };

        button(text(label))
            .style(style)
            .on_press(Message::SelectTab(tab))
            .into()
    }

    fn dashboard_view(&self) -> Element<'_, Message> {
        column![self.group_menu(), self.filter_bar(), self.items_view()]
            .spacing(12)
            .into()
    }

    fn group_menu(&self) -> Element<'_, Message> {
        let state = self.controller.groups_state();
        let mut menu = row![].spacing(4).align_items(Alignment::Center);

        for group in state.groups() {
            menu = menu.push(self.group_button(group, state.is_selected(group.id)));
        }

        let reload = if self.controller.is_loading() {
            button("Reload")
        } else {
            button("Reload").on_press(Message::Reload)
        };

        row![menu, Space::with_width(Length::Fill), reload]
            .spacing(12)
            .align_items(Alignment::Center)
            .into()
    }

    fn group_button(&self, group: &Group, active: bool) -> Element<'_, Message> {
        button(text(&group.name))
            .padding([6, 12])
            .style(theme::Button::custom(MenuTabStyle { active }))
            .on_press(Message::SelectGroup(group.id))
            .into()
    }

    fn filter_bar(&self) -> Element<'_, Message> {
        let filter = self.controller.filter();

        let name_input = text_input("Search by name", &filter.name)
            .on_input(Message::NameChanged)
            .padding(6)
            .width(Length::FillPortion(3));
        let clear = if filter.name.is_empty() {
            button("Clear")
        } else {
            button("Clear").on_press(Message::ClearName)
        };

        let status = pick_list(
            &StatusFilter::ALL[..],
            Some(filter.status),
            Message::StatusChanged,
        )
        .placeholder("Status");
        let density = pick_list(&Density::ALL[..], Some(filter.size), Message::DensityChanged)
            .placeholder("Size");
        let refresh = pick_list(
            &RefreshInterval::PRESETS[..],
            Some(filter.time),
            Message::RefreshChanged,
        )
        .placeholder("Refresh");

        row![
            name_input,
            clear,
            labeled("Status", status.into()),
            labeled("Size", density.into()),
            labeled("Refresh", refresh.into()),
        ]
        .spacing(12)
        .align_items(Alignment::Center)
        .into()
    }

    fn items_view(&self) -> Element<'_, Message> {
        match &self.dashboard {
            DashboardView::Idle => banner("Waiting for topology", muted_color()),
            DashboardView::Loading => banner("LOADING", muted_color()),
            DashboardView::Failed(error) => banner(format!("Error: {error}"), error_color()),
            DashboardView::NoData => banner("NO DATA", muted_color()),
            DashboardView::Items(items) => self.grid_view(items),
        }
    }

    fn grid_view<'a>(&'a self, items: &'a [VisibleItem]) -> Element<'a, Message> {
        let density = self.controller.filter().size;
        let columns = density.columns();
        let now = now_epoch_seconds();

        let mut grid = column![].spacing(8);
        for chunk in items.chunks(columns) {
            let mut line = row![].spacing(8);
            for item in chunk {
                line = line.push(item_card(item, density, now));
            }
            for _ in chunk.len()..columns {
                line = line.push(Space::with_width(Length::FillPortion(1)));
            }
            grid = grid.push(line);
        }

        scrollable(grid).height(Length::Fill).into()
    }

    fn logs_view(&self) -> Element<'_, Message> {
        let level_picker = pick_list(
            &LogLevel::ALL[..],
            Some(self.log_level),
            Message::LogLevelChanged,
        )
        .placeholder("Log level");

        let console_header = row![
            text("Console")
                .size(20)
                .style(theme::Text::Color(heading_color())),
            level_picker,
            text(format!("{} lines", self.visible_entries().len()))
                .size(12)
                .style(theme::Text::Color(muted_color())),
        ]
        .spacing(12)
        .align_items(Alignment::Center);

        let mut lines = column![].spacing(4);
        for entry in self.visible_entries() {
            lines = lines.push(
                text(entry.format_line())
                    .size(13)
                    .horizontal_alignment(Horizontal::Left)
                    .style(theme::Text::Color(level_color(entry.level))),
            );
        }

        let console = column![
            console_header,
            scrollable(lines).height(Length::Fill).width(Length::Fill)
        ]
        .spacing(12)
        .width(Length::FillPortion(4));

        row![console, self.target_filters_view()]
            .spacing(16)
            .align_items(Alignment::Start)
            .into()
    }

    fn target_filters_view(&self) -> Element<'_, Message> {
        let mut filter_column = column![text("Targets")
            .size(14)
            .style(theme::Text::Color(muted_color()))]
        .spacing(6);

        for target in self.sorted_targets() {
            let enabled = self.enabled_targets.contains(&target);
            filter_column = filter_column.push(
                checkbox(target.clone(), enabled)
                    .on_toggle(move |value| Message::ToggleTarget(target.clone(), value)),
            );
        }

        container(filter_column)
            .padding(8)
            .width(Length::FillPortion(1))
            .style(theme::Container::Box)
            .into()
    }
}

fn item_card<'a>(item: &'a VisibleItem, density: Density, now: EpochSeconds) -> Element<'a, Message> {
    let name_size = match density {
        Density::Normal => 18,
        Density::Small => 14,
    };

    let mut url_line = row![text(&item.server.url).size(12)].spacing(6);
    if item.status.state == ItemState::Connecting {
        url_line = url_line.push(text("connecting\u{2026}").size(12));
    }

    let content = column![
        text(&item.server.name).size(name_size),
        url_line,
        text(item.status.state.label()).size(12),
        text(checked_label(&item.status, now)).size(11),
    ]
    .spacing(4);

    button(content)
        .width(Length::FillPortion(1))
        .padding(density.padding())
        .style(theme::Button::custom(CardStyle {
            state: item.status.state,
        }))
        .on_press(Message::RefreshItem(item.key))
        .into()
}

fn banner<'a>(label: impl ToString, color: Color) -> Element<'a, Message> {
    container(text(label).size(16))
        .padding([6, 16])
        .style(theme::Container::Custom(Box::new(BannerStyle { color })))
        .center_x()
        .width(Length::Fill)
        .into()
}

fn labeled<'a>(label: &'a str, control: Element<'a, Message>) -> Element<'a, Message> {
    row![
        text(label).size(12).style(theme::Text::Color(muted_color())),
        control
    ]
    .spacing(6)
    .align_items(Alignment::Center)
    .into()
}

pub(crate) fn checked_label(status: &ItemStatus, now: EpochSeconds) -> String {
    match status.last_checked {
        None => "never checked".to_string(),
        Some(at) => match now.saturating_sub(at) {
            0..=4 => "checked just now".to_string(),
            secs @ 5..=119 => format!("checked {secs}s ago"),
            secs => format!("checked {}m ago", secs / 60),
        },
    }
}
