use ratatui::{
    layout::{Constraint, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::filter::KindFilter;
use crate::models::DATE_FORMAT;
use crate::ui::app::{App, AppTracker};
use crate::ui::theme::Palette;
use crate::ui::util::{format_amount, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App, tracker: &AppTracker, p: &Palette) {
    let title = table_title(app, tracker.transactions().len());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(p.border_style())
        .title(Span::styled(title, p.dim_style().add_modifier(Modifier::BOLD)));

    if app.visible.is_empty() {
        let msg = if app.query.is_default() {
            vec![
                Line::from(""),
                Line::from(Span::styled("No transactions yet", p.dim_style())),
                Line::from(""),
                Line::from(Span::styled(
                    "Add one with :add expense Food 12.50 Lunch",
                    p.dim_style(),
                )),
            ]
        } else {
            vec![
                Line::from(""),
                Line::from(Span::styled(
                    "No transactions match the current filters",
                    p.dim_style(),
                )),
                Line::from(""),
                Line::from(Span::styled("Reset them with :clear", p.dim_style())),
            ]
        };
        f.render_widget(Paragraph::new(msg).centered().block(block), area);
        return;
    }

    let header_cells = ["Date", "Title", "Category", "Type", "Amount"]
        .iter()
        .map(|h| Cell::from(*h).style(p.header_style()));
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = app
        .visible
        .iter()
        .enumerate()
        .skip(app.transaction_scroll)
        .take(area.height.saturating_sub(3) as usize)
        .map(|(i, txn)| {
            let (sign, amount_style) = if txn.is_income() {
                ("+", p.income_style())
            } else {
                ("-", p.expense_style())
            };

            let style = if i == app.transaction_index {
                p.selected_style()
            } else if i % 2 == 1 {
                p.alt_row_style()
            } else {
                p.normal_style()
            };

            Row::new(vec![
                Cell::from(format!("  {}", txn.date.format(DATE_FORMAT))),
                Cell::from(truncate(&txn.title, 40)),
                Cell::from(txn.entry.category_name()),
                Cell::from(txn.kind().as_str()),
                Cell::from(Span::styled(
                    format!("{sign}{}", format_amount(txn.amount)),
                    amount_style,
                )),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(14),
        Constraint::Min(20),
        Constraint::Length(15),
        Constraint::Length(9),
        Constraint::Length(16),
    ];

    let table = Table::new(rows, widths).header(header).block(block);
    f.render_widget(table, area);
}

fn table_title(app: &App, total: usize) -> String {
    let count = if app.visible.len() == total {
        format!("{total}")
    } else {
        format!("{} of {total}", app.visible.len())
    };
    let mut title = format!(" Transactions ({count}) ");
    if !app.query.search.is_empty() {
        title.push_str(&format!("search: '{}' ", app.query.search));
    }
    if app.query.kind != KindFilter::All {
        title.push_str(&format!("type: {} ", app.query.kind));
    }
    title.push_str(&format!("sort: {} ", app.query.order));
    title
}
