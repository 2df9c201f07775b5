use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Gauge, Paragraph},
    Frame,
};
use rust_decimal::Decimal;

use crate::aggregate::CategoryTotal;
use crate::ui::app::App;
use crate::ui::theme::Palette;
use crate::ui::util::{bar_value, format_amount, hex_color, percent_u16, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App, p: &Palette) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Summary cards
            Constraint::Min(8),    // Category breakdowns
            Constraint::Length(9), // Six-month trend
        ])
        .split(area);

    render_summary_cards(f, chunks[0], app, p);

    let breakdowns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);
    render_breakdown(
        f,
        breakdowns[0],
        " Expenses by Category ",
        &app.expense_breakdown,
        p,
    );
    render_breakdown(
        f,
        breakdowns[1],
        " Income by Category ",
        &app.income_breakdown,
        p,
    );

    render_trend(f, chunks[2], app, p);
}

fn titled_block<'a>(title: &'a str, p: &Palette) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(p.border_style())
        .title(Span::styled(
            title,
            p.dim_style().add_modifier(Modifier::BOLD),
        ))
}

fn render_summary_cards(f: &mut Frame, area: Rect, app: &App, p: &Palette) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(22),
            Constraint::Percentage(22),
            Constraint::Percentage(22),
            Constraint::Percentage(34),
        ])
        .split(area);

    let balance = app.balance.balance;

    render_card(f, cards[0], " Income ", app.balance.income, p.green, p);
    render_card(f, cards[1], " Expenses ", app.balance.expense, p.red, p);
    render_card(
        f,
        cards[2],
        " Balance ",
        balance,
        if balance >= Decimal::ZERO { p.green } else { p.red },
        p,
    );
    render_budget_gauge(f, cards[3], app, p);
}

fn render_card(f: &mut Frame, area: Rect, title: &str, amount: Decimal, color: Color, p: &Palette) {
    let text = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            format_amount(amount),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
    ])
    .centered()
    .block(titled_block(title, p));

    f.render_widget(text, area);
}

fn render_budget_gauge(f: &mut Frame, area: Rect, app: &App, p: &Palette) {
    let budget = &app.budget;
    let color = if budget.is_exhausted() {
        p.red
    } else if budget.percent > Decimal::from(75) {
        p.yellow
    } else {
        p.green
    };
    let label = format!(
        "{} of {} ({} left)",
        format_amount(budget.spent),
        format_amount(budget.limit),
        format_amount(budget.remaining)
    );

    let gauge = Gauge::default()
        .block(titled_block(" Budget ", p))
        .gauge_style(Style::default().fg(color).bg(p.surface))
        .percent(percent_u16(budget.percent))
        .label(Span::styled(label, p.normal_style().add_modifier(Modifier::BOLD)));

    f.render_widget(gauge, area);
}

fn render_breakdown(f: &mut Frame, area: Rect, title: &str, totals: &[CategoryTotal], p: &Palette) {
    if totals.is_empty() {
        let msg = Paragraph::new(Line::from(Span::styled(
            "Nothing recorded yet. Add one with :add",
            p.dim_style(),
        )))
        .centered()
        .block(titled_block(title, p));
        f.render_widget(msg, area);
        return;
    }

    let bars: Vec<Bar> = totals
        .iter()
        .map(|total| {
            let color = hex_color(total.color());
            Bar::default()
                .value(bar_value(total.total))
                .label(Line::from(truncate(total.name(), 10)))
                .text_value(format_amount(total.total))
                .style(Style::default().fg(color))
                .value_style(Style::default().fg(p.header_bg).bg(color))
        })
        .collect();

    let chart = BarChart::default()
        .block(titled_block(title, p))
        .data(BarGroup::default().bars(&bars))
        .bar_width(12)
        .bar_gap(1)
        .label_style(p.dim_style());

    f.render_widget(chart, area);
}

fn render_trend(f: &mut Frame, area: Rect, app: &App, p: &Palette) {
    let mut chart = BarChart::default()
        .block(titled_block(" Last 6 Months (income / expenses) ", p))
        .bar_width(5)
        .bar_gap(0)
        .group_gap(3)
        .label_style(p.dim_style());

    for bucket in &app.trend {
        let bars = [
            Bar::default()
                .value(bar_value(bucket.income))
                .text_value(String::new())
                .style(Style::default().fg(p.green)),
            Bar::default()
                .value(bar_value(bucket.expense))
                .text_value(String::new())
                .style(Style::default().fg(p.red)),
        ];
        chart = chart.data(
            BarGroup::default()
                .label(Line::from(bucket.label.clone()).centered())
                .bars(&bars),
        );
    }

    f.render_widget(chart, area);
}
