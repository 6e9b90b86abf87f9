// UI rendering logic
use crate::app::{App, Focus, SidebarItem, View};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use storefront_core::{
    format_price, NotificationLevel, Product, CARD_DESCRIPTION_CHARS, CARD_TITLE_CHARS,
};

const GRID_COLUMNS: usize = 4;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(8),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);

    match app.view {
        View::Catalog => render_catalog(frame, app, chunks[1]),
        View::Cart => render_cart(frame, app, chunks[1]),
    }

    render_status_bar(frame, app, chunks[2]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let tab_style = |active: bool| {
        if active {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        }
    };

    let line = Line::from(vec![
        Span::styled(
            "🛒 Storefront ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(" Products ", tab_style(app.view == View::Catalog)),
        Span::raw(" "),
        Span::styled(
            format!(" Cart ({}) ", app.cart.item_count()),
            tab_style(app.view == View::Cart),
        ),
    ]);

    let header = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

// ----- catalog view -----

fn render_catalog(frame: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(22), Constraint::Percentage(78)])
        .split(area);

    render_sidebar(frame, app, columns[0]);

    let show_pager = app.paginator.controls_visible(app.filtered_count());
    let grid_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(if show_pager {
            vec![Constraint::Min(5), Constraint::Length(3)]
        } else {
            vec![Constraint::Min(5)]
        })
        .split(columns[1]);

    render_grid(frame, app, grid_chunks[0]);
    if show_pager {
        render_pagination(frame, app, grid_chunks[1]);
    }
}

fn sidebar_label(app: &App, item: &SidebarItem) -> Line<'static> {
    let filters = &app.filters;
    let checkbox = |on: bool| if on { "[x] " } else { "[ ] " };
    let radio = |on: bool| if on { "(•) " } else { "( ) " };

    match item {
        SidebarItem::Reset => Line::from(vec![
            Span::styled("Filters  ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled("Reset", Style::default().fg(Color::Blue)),
        ]),
        SidebarItem::Category(category) => {
            let active = filters.selected_category == *category;
            let name = category.clone().unwrap_or_else(|| "All categories".to_string());
            Line::from(format!("{}{}", radio(active), name))
        }
        SidebarItem::PriceMin => Line::from(format!(
            "Min: {}  ◀ ▶",
            format_price(filters.price_range.min())
        )),
        SidebarItem::PriceMax => Line::from(format!(
            "Max: {}  ◀ ▶",
            format_price(filters.price_range.max())
        )),
        SidebarItem::Rating(rating) => Line::from(vec![
            Span::raw(checkbox(filters.selected_ratings.contains(rating))),
            Span::raw(format!("{} ", rating.stars())),
            Span::styled("★", Style::default().fg(Color::Yellow)),
        ]),
        SidebarItem::Sort(order) => {
            Line::from(format!("{}{}", radio(filters.sort_order == *order), order.label()))
        }
    }
}

fn section_heading(item: &SidebarItem, previous: Option<&SidebarItem>) -> Option<&'static str> {
    let same_section = matches!(
        (item, previous),
        (SidebarItem::Category(_), Some(SidebarItem::Category(_)))
            | (SidebarItem::PriceMax, Some(SidebarItem::PriceMin))
            | (SidebarItem::Rating(_), Some(SidebarItem::Rating(_)))
            | (SidebarItem::Sort(_), Some(SidebarItem::Sort(_)))
    );
    if same_section {
        return None;
    }
    match item {
        SidebarItem::Reset => None,
        SidebarItem::Category(_) => Some("Categories"),
        SidebarItem::PriceMin | SidebarItem::PriceMax => Some("Price"),
        SidebarItem::Rating(_) => Some("Rating"),
        SidebarItem::Sort(_) => Some("Sort By Price"),
    }
}

fn render_sidebar(frame: &mut Frame, app: &App, area: Rect) {
    let items = app.sidebar_items();
    let mut list_items = Vec::new();
    let mut selected_row = None;
    let mut previous: Option<&SidebarItem> = None;

    for (i, item) in items.iter().enumerate() {
        if let Some(heading) = section_heading(item, previous) {
            list_items.push(ListItem::new(Line::from(Span::styled(
                heading,
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ))));
        }
        if i == app.sidebar_cursor {
            selected_row = Some(list_items.len());
        }
        list_items.push(ListItem::new(sidebar_label(app, item)));
        previous = Some(item);
    }

    let focused = app.focus == Focus::Sidebar;
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let list = List::new(list_items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(" Filters "),
        )
        .highlight_style(if focused {
            Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        });

    let mut state = ListState::default();
    state.select(selected_row);
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_grid(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!(" Products ({}) ", app.filtered_count());

    if app.is_loading() {
        let loading = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "⏳ Loading products...",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(loading, area);
        return;
    }

    let page = app.page_products();
    if page.is_empty() {
        let message = if app.catalog.error().is_some() {
            "Products could not be loaded."
        } else {
            "No products match these filters."
        };
        let empty = Paragraph::new(message)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(empty, area);
        return;
    }

    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = page.len().div_ceil(GRID_COLUMNS);
    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, rows as u32); rows])
        .split(inner);

    for (row, row_area) in row_areas.iter().enumerate() {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, GRID_COLUMNS as u32); GRID_COLUMNS])
            .split(*row_area);

        for (col, cell) in cells.iter().enumerate() {
            let index = row * GRID_COLUMNS + col;
            if let Some(product) = page.get(index) {
                let selected = app.focus == Focus::Grid && index == app.grid_cursor;
                render_card(frame, product, selected, *cell);
            }
        }
    }
}

fn render_card(frame: &mut Frame, product: &Product, selected: bool, area: Rect) {
    let border_style = if selected {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let lines = vec![
        Line::from(Span::styled(
            product.short_title(CARD_TITLE_CHARS),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            product.short_description(CARD_DESCRIPTION_CHARS),
            Style::default().fg(Color::Gray),
        )),
        Line::from(Span::styled(
            format_price(product.price),
            Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            if selected { "[a] Add to cart" } else { "" },
            Style::default().fg(Color::Green),
        )),
    ];

    let card = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).border_style(border_style));
    frame.render_widget(card, area);
}

fn render_pagination(frame: &mut Frame, app: &App, area: Rect) {
    let current = app.filters.current_page;
    let mut spans = vec![Span::raw("‹ Previous  ")];

    for n in 1..=app.total_pages() {
        let style = if n == current {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        spans.push(Span::styled(format!(" {} ", n), style));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::raw(" Next ›"));

    let bar = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(bar, area);
}

// ----- cart view -----

fn render_cart(frame: &mut Frame, app: &App, area: Rect) {
    if app.cart.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "Your cart is empty.",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("🛒"),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(" Cart "));
        frame.render_widget(empty, area);
        return;
    }

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(66), Constraint::Percentage(34)])
        .split(area);

    let items: Vec<ListItem> = app
        .cart
        .lines()
        .iter()
        .map(|line| {
            ListItem::new(vec![
                Line::from(Span::styled(
                    line.short_title(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(format!("Price: {}", format_price(line.product.price))),
                Line::from(vec![
                    Span::raw("[-] "),
                    Span::styled(
                        format!(" {} ", line.quantity),
                        Style::default().fg(Color::Black).bg(Color::Yellow),
                    ),
                    Span::raw(" [+]    "),
                    Span::styled("[x] Remove", Style::default().fg(Color::Red)),
                ]),
                Line::from(""),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" Cart "))
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("▶ ");

    let mut state = ListState::default();
    state.select(Some(app.cart_cursor));
    frame.render_stateful_widget(list, columns[0], &mut state);

    render_price_details(frame, app, columns[1]);
}

fn render_price_details(frame: &mut Frame, app: &App, area: Rect) {
    let total = app.cart.total() + app.cart.delivery_fee();
    let lines = vec![
        Line::from(vec![
            Span::styled("Subtotal:     ", Style::default().fg(Color::Gray)),
            Span::styled(
                format_price(app.cart.total()),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Delivery Fee: ", Style::default().fg(Color::Gray)),
            Span::styled("Free", Style::default().fg(Color::Green)),
        ]),
        Line::from("──────────────────────"),
        Line::from(vec![
            Span::styled("Total:        ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(
                format_price(total),
                Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "[o] Complete Order",
            Style::default().fg(Color::Black).bg(Color::Green),
        )),
    ];

    let details = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Price Details "));
    frame.render_widget(details, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status = if let Some(toast) = app.current_toast() {
        let color = match toast.level() {
            NotificationLevel::Success => Color::Green,
            NotificationLevel::Error => Color::Red,
        };
        Span::styled(toast.to_string(), Style::default().fg(color))
    } else {
        match app.view {
            View::Catalog => Span::raw(match app.focus {
                Focus::Grid => "h/l: select | [/]: page | a/ENTER: add to cart | TAB: filters | r: reset | c: cart | q: quit",
                Focus::Sidebar => "j/k: navigate | ENTER/SPACE: toggle | ◀/▶: adjust price | TAB: products | c: cart | q: quit",
            }),
            View::Cart => Span::raw(
                "j/k: navigate | +/-: quantity | x: remove | o: complete order | p/ESC: products | q: quit",
            ),
        }
    };

    frame.render_widget(Paragraph::new(Line::from(status)), area);
}
