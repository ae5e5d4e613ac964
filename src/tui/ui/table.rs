use crate::agents::DecisionPoint;
use crate::cards::{Card, Rank, Suit};
use crate::controller::Announcement;
use crate::settings::SeatKind;
use crate::tui::app::AppState;
use ratatui::prelude::*;
use ratatui::widgets::*;

use super::layout::{centered_rect, inner, seat_columns};

pub(super) fn draw_table(f: &mut Frame, app: &AppState) {
    let chunks = Layout::vertical([
        Constraint::Length(4), // header
        Constraint::Length(7), // seats
        Constraint::Length(5), // trick
        Constraint::Min(5),    // hand
        Constraint::Length(4), // status bar
    ])
    .split(f.area());

    draw_header(f, app, chunks[0]);
    draw_seats(f, app, chunks[1]);
    draw_trick(f, app, chunks[2]);
    draw_hand(f, app, chunks[3]);
    draw_status(f, app, chunks[4]);

    if app.help_open() {
        draw_help(f);
    } else if app.history_open() {
        draw_history(f, app);
    } else if app.amount_entry_active() {
        draw_amount_entry(f, app);
    }
}

fn draw_header(f: &mut Frame, app: &AppState, area: Rect) {
    let t = &app.table;
    let bid = match t.bidder {
        Some(seat) => format!("Bid: {} by P{}", t.bid, seat + 1),
        None => "Bid: --".to_string(),
    };
    let contract = match t.announcement {
        Some(Announcement::Trump(suit)) => format!("Trump: {}", suit.name()),
        Some(Announcement::GoingOut) => "Declarer went out".to_string(),
        Some(other) => format!("{other:?}"),
        None => "Trump: --".to_string(),
    };
    let lines = vec![
        Line::from(format!(
            "Dealer P{}   {}   {}   Dabb: {}",
            app.record.dealer + 1,
            bid,
            contract,
            t.dabb.len()
        )),
        Line::from(format!(
            "Seed {}   Tricks played: {}   {}s",
            app.record.seed,
            t.trick_winners.len(),
            app.started.elapsed().as_secs()
        )),
    ];
    let header =
        Paragraph::new(lines).block(Block::default().title("binokel").borders(Borders::ALL));
    f.render_widget(header, area);
}

fn draw_seats(f: &mut Frame, app: &AppState, area: Rect) {
    let t = &app.table;
    let players = app.record.settings.player_count;
    for (seat, seat_area) in seat_columns(area, players).into_iter().enumerate() {
        let mut title = format!("P{}", seat + 1);
        if seat == app.record.dealer {
            title.push_str(" [D]");
        }
        match app.record.seat_kind(seat) {
            SeatKind::Human => title.push_str(" [You]"),
            SeatKind::Bot => title.push_str(" [BOT]"),
        }
        if t.declarer == Some(seat) {
            title.push_str(" [Decl]");
        }
        let mut block = Block::default().title(title).borders(Borders::ALL);
        if t.turn == Some(seat) {
            block = block.border_style(Style::default().fg(Color::Yellow));
        } else if seat == app.focus {
            block = block.border_style(Style::default().fg(Color::Cyan));
        }
        let won = t.tricks_won.get(seat).copied().unwrap_or(0);
        let lines = vec![
            Line::from(format!("Cards: {}", t.hand(seat).len())),
            Line::from(format!("Tricks: {won}")),
            Line::from(if t.bidder == Some(seat) { "High bid" } else { "" }),
        ];
        f.render_widget(block, seat_area);
        f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner(seat_area));
    }
}

fn draw_trick(f: &mut Frame, app: &AppState, area: Rect) {
    let t = &app.table;
    let (title, cards) = if t.trick.is_empty() && !t.last_trick.is_empty() {
        ("Last trick", &t.last_trick)
    } else {
        ("Trick", &t.trick)
    };
    let block = Block::default().title(title).borders(Borders::ALL);
    let trick_inner = inner(area);
    f.render_widget(block, area);
    let slots = seat_columns(trick_inner, app.record.settings.player_count);
    for (i, slot) in slots.into_iter().enumerate() {
        let played = cards.get(i);
        let label = played.map(|(seat, _)| format!("P{}", seat + 1));
        render_card_widget(f, slot, played.map(|&(_, c)| c), label, None);
    }
}

fn draw_hand(f: &mut Frame, app: &AppState, area: Rect) {
    let hand = app.shown_hand();
    let prompt = app.prompt();
    let title = match prompt {
        Some(view) => format!("Your hand (P{}): {}", view.seat + 1, point_hint(view.point)),
        None => format!("Hand of P{}", app.focus + 1),
    };
    let block = Block::default().title(title).borders(Borders::ALL);
    let hand_inner = inner(area);
    f.render_widget(block, area);
    if hand.is_empty() {
        return;
    }
    let slots = seat_columns(Rect { height: hand_inner.height.min(3), ..hand_inner }, hand.len());
    for (i, (slot, &card)) in slots.into_iter().zip(hand).enumerate() {
        let legal = prompt.is_some_and(|v| v.point != DecisionPoint::Card || v.legal_cards.contains(&card));
        let border = if prompt.is_some() && i == app.cursor {
            Some(Color::Yellow)
        } else if app.is_selected(i) {
            Some(Color::Magenta)
        } else if legal {
            Some(Color::Cyan)
        } else {
            None
        };
        render_card_widget(f, slot, Some(card), None, border);
    }
}

fn draw_status(f: &mut Frame, app: &AppState, area: Rect) {
    f.render_widget(Block::default().borders(Borders::ALL).title("Status"), area);
    let cols = Layout::horizontal([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(inner(area));

    let mut left = Vec::new();
    match app.prompt() {
        Some(view) => left.push(Line::from(match view.point {
            DecisionPoint::Exchange => format!(
                "Trump: {}  selected {}/{}",
                app.trump_choice.name(),
                (0..view.hand.len()).filter(|&i| app.is_selected(i)).count(),
                view.dabb_size
            ),
            DecisionPoint::Card => "Choose a card".to_string(),
            _ => format!("Bid {}  minimum {}", view.bid, view.min_bid),
        })),
        None => left.push(Line::from(app.last_event().unwrap_or("Waiting for the table").to_string())),
    }
    if let Some(err) = app.action_error() {
        left.push(Line::from(Span::styled(
            format!("Error: {err}"),
            Style::default().fg(Color::Red),
        )));
    }
    let right = vec![Line::from("? help • H history • Q quit")];
    f.render_widget(Paragraph::new(left).wrap(Wrap { trim: true }), cols[0]);
    f.render_widget(
        Paragraph::new(right).wrap(Wrap { trim: true }).alignment(Alignment::Right),
        cols[1],
    );
}

pub(super) fn draw_summary(f: &mut Frame, app: &AppState) {
    let area = centered_rect(60, 50, f.area());
    let block = Block::default().title("Round over").borders(Borders::ALL);
    let mut lines = Vec::new();
    match app.summary() {
        Some(Ok(summary)) => {
            lines.push(Line::from(summary.to_string()));
            lines.push(Line::from(""));
            for (seat, won) in summary.tricks_won.iter().enumerate() {
                lines.push(Line::from(format!("P{}: {won} tricks", seat + 1)));
            }
        }
        Some(Err(err)) => lines.push(Line::from(Span::styled(
            format!("Round aborted: {err}"),
            Style::default().fg(Color::Red),
        ))),
        None => lines.push(Line::from("No result")),
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Enter or Q to quit",
        Style::default().add_modifier(Modifier::DIM),
    )));
    f.render_widget(Clear, area);
    f.render_widget(block, area);
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner(area));
}

fn draw_history(f: &mut Frame, app: &AppState) {
    let area = centered_rect(70, 80, f.area());
    let block = Block::default().title("History").borders(Borders::ALL);
    let mut lines: Vec<Line> = app.history_page().iter().map(|s| Line::from(s.as_str())).collect();
    if lines.is_empty() {
        lines.push(Line::from("No history yet."));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Up/Down scroll • Close: H or Esc",
        Style::default().add_modifier(Modifier::DIM),
    )));
    let para = Paragraph::new(lines).wrap(Wrap { trim: true });
    f.render_widget(Clear, area);
    f.render_widget(block, area);
    f.render_widget(para, inner(area));
}

fn draw_help(f: &mut Frame) {
    let area = centered_rect(70, 80, f.area());
    let block = Block::default().title("Help").borders(Borders::ALL);
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let lines = vec![
        Line::from(Span::styled("Bidding:", bold)),
        Line::from("- 0-9 / Backspace: edit amount"),
        Line::from("- + / -: adjust by one step"),
        Line::from("- Enter: bid, P: pass"),
        Line::from(""),
        Line::from(Span::styled("Dabb:", bold)),
        Line::from("- Left / Right: move, Space: lay away"),
        Line::from("- T: cycle trump, Enter: confirm"),
        Line::from("- O: go out"),
        Line::from(""),
        Line::from(Span::styled("Tricks:", bold)),
        Line::from("- Left / Right: move, Enter: play"),
        Line::from(""),
        Line::from("- H: history, Q: quit"),
        Line::from("Close help: ? or Esc"),
    ];
    let para = Paragraph::new(lines).wrap(Wrap { trim: true });
    f.render_widget(Clear, area);
    f.render_widget(block, area);
    f.render_widget(para, inner(area));
}

fn draw_amount_entry(f: &mut Frame, app: &AppState) {
    let Some(view) = app.prompt() else {
        return;
    };
    let area = centered_rect(50, 30, f.area());
    let title = match view.point {
        DecisionPoint::CounterBid => "Counter bid",
        DecisionPoint::BidAnswer => "Hold the bid",
        _ => "Opening bid",
    };
    let current = app.amount_entry_text().unwrap_or("");
    let lines = vec![
        Line::from(format!("Amount: {current}")),
        Line::from(format!("Min: {}", view.min_bid)),
        Line::from("Digits to edit, +/- by step"),
        Line::from("Enter submit, P pass"),
    ];
    let block = Block::default().title(title).borders(Borders::ALL);
    let chunks = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(inner(area));
    f.render_widget(Clear, area);
    f.render_widget(block, area);
    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center), chunks[0]);
    let error = app.action_error().unwrap_or("");
    let error_line = Line::from(Span::styled(error, Style::default().fg(Color::Red)));
    f.render_widget(Paragraph::new(error_line).alignment(Alignment::Center), chunks[1]);
}

fn point_hint(point: DecisionPoint) -> &'static str {
    match point {
        DecisionPoint::FirstBid => "open the bidding",
        DecisionPoint::CounterBid => "counter or pass",
        DecisionPoint::BidAnswer => "hold or pass",
        DecisionPoint::Exchange => "lay away and name trump",
        DecisionPoint::Card => "play a card",
    }
}

fn suit_glyph_and_style(s: Suit) -> (char, Style) {
    match s {
        Suit::Hearts => ('♥', Style::default().fg(Color::Red)),
        Suit::Diamonds => ('♦', Style::default().fg(Color::Red)),
        Suit::Spades => ('♠', Style::default().fg(Color::White)),
        Suit::Clubs => ('♣', Style::default().fg(Color::White)),
    }
}

fn rank_label(r: Rank) -> &'static str {
    match r {
        Rank::Seven => "7",
        Rank::Jack => "U",
        Rank::Queen => "O",
        Rank::King => "K",
        Rank::Ten => "10",
        Rank::Ace => "A",
    }
}

fn render_card_widget(
    f: &mut Frame,
    area: Rect,
    card: Option<Card>,
    title: Option<String>,
    border: Option<Color>,
) {
    let mut block = Block::default().borders(Borders::ALL).title_alignment(Alignment::Center);
    if let Some(t) = title {
        block = block.title(t);
    }
    if let Some(color) = border {
        block = block.border_style(Style::default().fg(color));
    }
    let card_inner = inner(area);
    f.render_widget(block, area);
    let content = match card {
        Some(c) => {
            let (glyph, style) = suit_glyph_and_style(c.suit());
            Line::from(Span::styled(format!("{}{}", rank_label(c.rank()), glyph), style))
        }
        None => Line::from("[  ]"),
    };
    f.render_widget(Paragraph::new(content).alignment(Alignment::Center), card_inner);
}
