use code_route::storage::Storage;
use code_route::view::{
    Bilingual, Body, Card, CardList, Face, FlashcardView, Notice, ProgressView, QuizView, Screen,
    ScreenView, ViewAction,
};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, Clear, List, ListItem, Paragraph, Scrollbar, ScrollbarState, Wrap,
    },
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::keymap::{key_for, KeyAction};
use super::theme::Theme;
use super::{Popup, Tui};

const TIP_PREFIX: &str = "Exam tip: ";

pub(super) fn ui<S: Storage>(f: &mut Frame, tui: &mut Tui<S>) {
    let view = tui.app.view();
    tui.clamp_selection(&view);

    // header + title + body + footer
    let v = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(2),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_header(f, v[0], tui);
    draw_title(f, v[1], tui, &view);
    match &view.body {
        Body::Cards(list) => draw_cards(f, v[2], tui, list),
        Body::Flashcard(card) => draw_flashcard(f, v[2], tui, card),
        Body::Quiz(quiz) => draw_quiz(f, v[2], tui, quiz),
        Body::Progress(p) => draw_progress(f, v[2], tui, p),
        Body::Empty(notice) => draw_empty(f, v[2], tui.theme, notice),
    }
    draw_footer(f, v[3], tui);
    draw_popup(f, tui);
}

fn draw_header<S: Storage>(f: &mut Frame, area: Rect, tui: &Tui<S>) {
    let th = tui.theme;
    let active = tui.app.screen().nav_index();
    let mut segs = vec![Span::styled(
        " code-route ",
        Style::default().fg(th.accent).add_modifier(Modifier::BOLD),
    )];
    for (i, screen) in Screen::NAV.iter().enumerate() {
        let label = format!(" {} {} ", i + 1, screen.nav_label());
        segs.push(if i == active {
            Span::styled(
                label,
                Style::default()
                    .fg(th.accent)
                    .bg(th.selection_bg)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(label, Style::default().fg(th.muted))
        });
    }
    let settings = tui.app.settings();
    segs.push(Span::styled(" | ", Style::default().fg(th.muted)));
    segs.push(Span::styled(
        if settings.english_first { "EN/FR" } else { "FR/EN" },
        Style::default().fg(th.fg),
    ));
    segs.push(Span::styled(" | hints:", Style::default().fg(th.muted)));
    segs.push(Span::styled(
        if settings.show_hints { "on" } else { "off" },
        Style::default().fg(if settings.show_hints { th.good } else { th.muted }),
    ));
    let para = Paragraph::new(Line::from(segs)).style(Style::default().bg(th.bar_bg).fg(th.fg));
    f.render_widget(para, area);
}

fn draw_title<S: Storage>(f: &mut Frame, area: Rect, tui: &Tui<S>, view: &ScreenView) {
    let th = tui.theme;
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(area);
    let width = rows[0].width as usize;
    let title = fit(&view.title, width.saturating_sub(2));
    let rest = width.saturating_sub(title.width() + 4);
    let line = Line::from(vec![
        Span::styled(
            format!(" {title}"),
            Style::default().fg(th.fg).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("  {}", fit(&view.subtitle, rest)),
            Style::default().fg(th.muted),
        ),
    ]);
    f.render_widget(Paragraph::new(line), rows[0]);

    if tui.searching {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(3), Constraint::Min(1)])
            .split(rows[1]);
        f.render_widget(
            Paragraph::new(Span::styled(" /", Style::default().fg(th.accent))),
            cols[0],
        );
        f.render_widget(&tui.search, cols[1]);
    } else if !tui.app.search().is_empty() {
        let line = Line::from(vec![
            Span::styled(" search: ", Style::default().fg(th.muted)),
            Span::styled(tui.app.search().to_string(), Style::default().fg(th.fg)),
            Span::styled("  [Esc] clear", Style::default().fg(th.muted)),
        ]);
        f.render_widget(Paragraph::new(line), rows[1]);
    }
}

fn draw_footer<S: Storage>(f: &mut Frame, area: Rect, tui: &Tui<S>) {
    let th = tui.theme;
    let line = match &tui.status {
        Some(status) => Line::from(Span::styled(format!(" {status}"), Style::default().fg(th.warn))),
        None => {
            let key = |a| key_for(&tui.keymap, a).map(key_label).unwrap_or_default();
            Line::from(Span::styled(
                format!(
                    " [q] quit  [Tab/1-7] screens  [j/k] move  [Enter] select  [{}] search  [{}] help ",
                    key(KeyAction::Search),
                    key(KeyAction::Help)
                ),
                Style::default().fg(th.muted),
            ))
        }
    };
    let para = Paragraph::new(line).style(Style::default().bg(th.bar_bg));
    f.render_widget(para, area);
}

// ---------------- Bodies ----------------

fn draw_cards<S: Storage>(f: &mut Frame, area: Rect, tui: &mut Tui<S>, list: &CardList) {
    let th = tui.theme;
    let mut rest = area;

    if let Some(header) = &list.header {
        let lines = card_lines(header, tui);
        let height = (lines.len() as u16 + 2).min(rest.height / 2);
        let (top, bottom) = split_top(rest, height);
        let para = Paragraph::new(lines)
            .block(bordered(" Module ", th))
            .wrap(Wrap { trim: false });
        f.render_widget(para, top);
        rest = bottom;
    }
    if let Some(notice) = &list.notice {
        let (top, bottom) = split_top(rest, 2);
        let lines = vec![
            Line::from(Span::styled(
                format!(" {}", notice.title),
                Style::default().fg(th.accent).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(format!(" {}", notice.hint), Style::default().fg(th.muted))),
        ];
        f.render_widget(Paragraph::new(lines), top);
        rest = bottom;
    }
    if let Some(empty) = &list.empty {
        draw_empty(f, rest, th, empty);
        return;
    }

    let h = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rest);
    let width = h[0].width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = list
        .cards
        .iter()
        .map(|c| {
            let mark = match c.learned {
                Some(true) => Span::styled("✓ ", Style::default().fg(th.good)),
                Some(false) => Span::styled("· ", Style::default().fg(th.muted)),
                None => Span::raw("  "),
            };
            let badge = format!(" [{}]", c.badge);
            let title = fit(&c.title, width.saturating_sub(2 + badge.width()));
            ListItem::new(Line::from(vec![
                mark,
                Span::styled(title, Style::default().fg(th.fg)),
                Span::styled(badge, Style::default().fg(th.muted)),
            ]))
        })
        .collect();
    let title = format!(" {} items ", list.cards.len());
    let widget = List::new(items)
        .block(bordered(&title, th))
        .highlight_style(
            Style::default()
                .bg(th.selection_bg)
                .fg(th.fg)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");
    f.render_stateful_widget(widget, h[0], &mut tui.selected);
    draw_scrollbar(f, h[0], tui.selected.selected().unwrap_or(0), list.cards.len());

    if let Some(card) = tui.selected.selected().and_then(|i| list.cards.get(i)) {
        let para = Paragraph::new(card_lines(card, tui))
            .block(bordered(" Details ", th))
            .wrap(Wrap { trim: false });
        f.render_widget(para, h[1]);
    }
}

fn draw_flashcard<S: Storage>(f: &mut Frame, area: Rect, tui: &Tui<S>, card: &FlashcardView) {
    let th = tui.theme;
    let area = centered_rect(80, 80, area);
    let (face, tip_prefix) = match card.face {
        Face::Front => ("Front", ""),
        Face::Back => ("Back", TIP_PREFIX),
    };
    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("Source: {}", card.source), Style::default().fg(th.muted)),
            Span::raw("   "),
            Span::styled(face, Style::default().fg(th.accent).add_modifier(Modifier::BOLD)),
        ]),
        Line::default(),
    ];
    bilingual_lines(&mut lines, &card.text, th, tip_prefix);
    action_lines(&mut lines, &card.actions, tui);
    let title = format!(" Card {} / {} ", card.position, card.pool_size);
    let para = Paragraph::new(lines)
        .block(bordered(&title, th))
        .wrap(Wrap { trim: false });
    f.render_widget(para, area);
}

fn draw_quiz<S: Storage>(f: &mut Frame, area: Rect, tui: &mut Tui<S>, quiz: &QuizView) {
    let th = tui.theme;
    let badge_color = if quiz.answered { th.good } else { th.warn };
    let mut top = vec![Line::from(vec![
        Span::styled(format!("[{}]", quiz.badge()), Style::default().fg(badge_color)),
        Span::styled(format!("  Topic tags: {}", quiz.tags), Style::default().fg(th.muted)),
    ])];
    top.push(Line::default());
    bilingual_lines(&mut top, &quiz.question, th, TIP_PREFIX);

    let mut bottom = Vec::new();
    if let Some(explanation) = &quiz.explanation {
        bilingual_lines(&mut bottom, explanation, th, "");
    }
    action_lines(&mut bottom, &quiz.actions, tui);

    let v = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(top.len() as u16 + 2),
            Constraint::Min(3),
            Constraint::Length(bottom.len() as u16 + 2),
        ])
        .split(area);

    let title = format!(" Question {} / {} ", quiz.position, quiz.pool_size);
    f.render_widget(
        Paragraph::new(top)
            .block(bordered(&title, th))
            .wrap(Wrap { trim: false }),
        v[0],
    );

    let items: Vec<ListItem> = quiz
        .options
        .iter()
        .map(|o| {
            let color = th.option_color(o.state);
            let mut first = vec![Span::styled(
                format!("{}. {}", o.letter, o.text.primary),
                Style::default().fg(color),
            )];
            if o.is_chosen {
                first.push(Span::styled("  (your answer)", Style::default().fg(th.muted)));
            }
            ListItem::new(vec![
                Line::from(first),
                Line::from(Span::styled(
                    format!("   {}", o.text.secondary),
                    Style::default().fg(th.muted),
                )),
            ])
        })
        .collect();
    let options = List::new(items)
        .block(bordered(" Options ", th))
        .highlight_style(Style::default().bg(th.selection_bg))
        .highlight_symbol("▸ ");
    f.render_stateful_widget(options, v[1], &mut tui.selected);

    let bottom_title = if quiz.explanation.is_some() { " Explanation " } else { "" };
    f.render_widget(
        Paragraph::new(bottom)
            .block(bordered(bottom_title, th))
            .wrap(Wrap { trim: false }),
        v[2],
    );
}

fn draw_progress<S: Storage>(f: &mut Frame, area: Rect, tui: &mut Tui<S>, p: &ProgressView) {
    let th = tui.theme;
    let kpi = |label: &str, value: String| {
        Line::from(vec![
            Span::styled(format!(" {label:<24}"), Style::default().fg(th.muted)),
            Span::styled(value, Style::default().fg(th.fg).add_modifier(Modifier::BOLD)),
        ])
    };
    let kpis = vec![
        kpi("Items marked learned", p.learned_items.to_string()),
        kpi("Total review clicks", p.total_reviews.to_string()),
        kpi("Quiz answered", p.quiz_answered.to_string()),
        kpi("Quiz accuracy", format!("{}%", p.accuracy_percent)),
    ];
    let v = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(kpis.len() as u16 + 2),
            Constraint::Length(p.tools.len() as u16 + 2),
            Constraint::Min(0),
        ])
        .split(area);
    f.render_widget(Paragraph::new(kpis).block(bordered(" Overview ", th)), v[0]);

    let items: Vec<ListItem> = p
        .tools
        .iter()
        .map(|t| ListItem::new(Line::from(Span::styled(action_label(t, tui), Style::default().fg(th.fg)))))
        .collect();
    let tools = List::new(items)
        .block(bordered(" Tools ", th))
        .highlight_style(Style::default().bg(th.selection_bg).add_modifier(Modifier::BOLD))
        .highlight_symbol("▸ ");
    f.render_stateful_widget(tools, v[1], &mut tui.selected);

    let advice: Vec<Line> = p
        .advice
        .iter()
        .map(|a| Line::from(Span::styled(format!(" {a}"), Style::default().fg(th.muted))))
        .collect();
    f.render_widget(Paragraph::new(advice).wrap(Wrap { trim: false }), v[2]);
}

fn draw_empty(f: &mut Frame, area: Rect, th: Theme, notice: &Notice) {
    let area = centered_rect(60, 40, area);
    let lines = vec![
        Line::from(Span::styled(
            notice.title.clone(),
            Style::default().fg(th.fg).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(Span::styled(notice.hint.clone(), Style::default().fg(th.muted))),
    ];
    let para = Paragraph::new(lines)
        .block(bordered("", th))
        .wrap(Wrap { trim: false });
    f.render_widget(para, area);
}

fn draw_popup<S: Storage>(f: &mut Frame, tui: &Tui<S>) {
    let th = tui.theme;
    match &tui.popup {
        None => {}
        Some(Popup::ConfirmReset) => {
            let area = centered_rect(50, 25, f.area());
            f.render_widget(Clear, area);
            let lines = vec![
                Line::from(Span::styled(
                    "Reset all progress?",
                    Style::default().fg(th.bad).add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled("This cannot be undone.", Style::default().fg(th.fg))),
                Line::default(),
                Line::from(Span::styled(
                    "[y] reset   any other key cancels",
                    Style::default().fg(th.muted),
                )),
            ];
            f.render_widget(
                Paragraph::new(lines).block(bordered(" Reset ", th)),
                area,
            );
        }
        Some(Popup::Import(input)) => {
            let area = centered_rect(60, 20, f.area());
            f.render_widget(Clear, area);
            let block = bordered(" Import progress JSON  [Enter] import  [Esc] cancel ", th);
            let inner = block.inner(area);
            f.render_widget(block, area);
            f.render_widget(input, inner);
        }
        Some(Popup::Help) => {
            let area = centered_rect(60, 70, f.area());
            f.render_widget(Clear, area);
            let mut lines = vec![
                help_line("q", "quit", th),
                help_line("Tab/1-7", "switch screen", th),
                help_line("j/k", "move selection", th),
                help_line("Enter", "primary action / choose option", th),
                help_line("Esc", "back / clear search", th),
            ];
            for action in KeyAction::ALL {
                if let Some(ch) = key_for(&tui.keymap, action) {
                    lines.push(help_line(&key_label(ch), action.describe(), th));
                }
            }
            f.render_widget(
                Paragraph::new(lines).block(bordered(" Keys (any key closes) ", th)),
                area,
            );
        }
    }
}

// ---------------- Pieces ----------------

fn card_lines<S: Storage>(card: &Card, tui: &Tui<S>) -> Vec<Line<'static>> {
    let th = tui.theme;
    let mut lines = vec![Line::from(Span::styled(
        card.title.clone(),
        Style::default().fg(th.accent).add_modifier(Modifier::BOLD),
    ))];
    if !card.subtitle.is_empty() && card.subtitle != card.title {
        lines.push(Line::from(Span::styled(
            card.subtitle.clone(),
            Style::default().fg(th.muted),
        )));
    }
    if !card.badge.is_empty() {
        let color = if card.learned == Some(true) { th.good } else { th.warn };
        lines.push(Line::from(Span::styled(
            format!("[{}]", card.badge),
            Style::default().fg(color),
        )));
    }
    if let Some(text) = &card.text {
        lines.push(Line::default());
        bilingual_lines(&mut lines, text, th, TIP_PREFIX);
    }
    if let Some(example) = &card.example {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "Example",
            Style::default().fg(th.muted).add_modifier(Modifier::BOLD),
        )));
        bilingual_lines(&mut lines, example, th, TIP_PREFIX);
    }
    action_lines(&mut lines, &card.actions, tui);
    lines
}

fn bilingual_lines(lines: &mut Vec<Line<'static>>, text: &Bilingual, th: Theme, tip_prefix: &str) {
    lines.push(Line::from(Span::styled(
        text.primary.clone(),
        Style::default().fg(th.fg),
    )));
    if !text.secondary.is_empty() {
        lines.push(Line::from(Span::styled(
            text.secondary.clone(),
            Style::default().fg(th.muted).add_modifier(Modifier::ITALIC),
        )));
    }
    if let Some(hint) = &text.hint {
        lines.push(Line::from(Span::styled(
            format!("{tip_prefix}{hint}"),
            Style::default().fg(th.warn),
        )));
    }
}

fn action_lines<S: Storage>(lines: &mut Vec<Line<'static>>, actions: &[ViewAction], tui: &Tui<S>) {
    if actions.is_empty() {
        return;
    }
    lines.push(Line::default());
    for a in actions {
        let style = if a.primary {
            Style::default().fg(tui.theme.accent)
        } else {
            Style::default().fg(tui.theme.muted)
        };
        lines.push(Line::from(Span::styled(action_label(a, tui), style)));
    }
}

/// "[m/Enter] Mark learned"
fn action_label<S: Storage>(action: &ViewAction, tui: &Tui<S>) -> String {
    let mut keys: Vec<String> = KeyAction::ALL
        .iter()
        .find(|k| k.accepts(&action.intent))
        .and_then(|k| key_for(&tui.keymap, *k))
        .map(key_label)
        .into_iter()
        .collect();
    if action.primary {
        keys.push("Enter".into());
    }
    if keys.is_empty() {
        action.label.clone()
    } else {
        format!("[{}] {}", keys.join("/"), action.label)
    }
}

fn help_line(key: &str, what: &str, th: Theme) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!(" {key:<10}"), Style::default().fg(th.accent)),
        Span::styled(what.to_string(), Style::default().fg(th.fg)),
    ])
}

fn key_label(ch: char) -> String {
    if ch == ' ' {
        "Space".into()
    } else {
        ch.to_string()
    }
}

fn bordered(title: &str, th: Theme) -> Block<'static> {
    Block::default()
        .title(Span::styled(title.to_string(), Style::default().fg(th.accent)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(th.muted))
}

fn split_top(area: Rect, height: u16) -> (Rect, Rect) {
    let v = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(height), Constraint::Min(0)])
        .split(area);
    (v[0], v[1])
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vert[1]);
    horiz[1]
}

fn draw_scrollbar(f: &mut Frame, area: Rect, position: usize, content_len: usize) {
    if area.height <= 2 || content_len <= area.height.saturating_sub(2) as usize {
        return;
    }
    let mut state = ScrollbarState::new(content_len).position(position);
    let sb_area = Rect {
        x: area.x + area.width.saturating_sub(1),
        y: area.y + 1,
        width: 1,
        height: area.height.saturating_sub(2),
    };
    f.render_stateful_widget(Scrollbar::default(), sb_area, &mut state);
}

/// Truncates to `width` terminal columns, marking the cut with an ellipsis.
fn fit(s: &str, width: usize) -> String {
    if s.width() <= width {
        return s.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use code_route::content::MemorySource;
    use code_route::storage::MemoryStorage;
    use code_route::App;
    use ratatui::{backend::TestBackend, Terminal};

    use crate::tui::keymap::default_keymap;

    #[test]
    fn fit_respects_display_width() {
        assert_eq!(fit("Stop", 10), "Stop");
        assert_eq!(fit("Priorité à droite", 8), "Priorit…");
        assert_eq!(fit("Priorité", 0), "");
    }

    fn render(tui: &mut Tui<MemoryStorage>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| ui(f, tui)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    fn tui() -> Tui<MemoryStorage> {
        let source = MemorySource::new()
            .with(
                "modules",
                r#"[{"id":"M1","title_fr":"Panneaux","title_en":"Signs","includes":["signs"],"tags":["signs"]}]"#,
            )
            .with(
                "signs",
                r#"[{"id":"S1","title_fr":"Stop","title_en":"Stop sign","fr":"Arrêt","en":"Halt","tip":"Trois secondes","category":"obligation","tags":["signs"]}]"#,
            )
            .with("rules", "[]")
            .with("vocab", "[]")
            .with("questions", "[]");
        let app = App::load(&source, MemoryStorage::new()).unwrap();
        Tui::new(app, default_keymap(), std::env::temp_dir())
    }

    #[test]
    fn modules_screen_renders_titles() {
        let mut tui = tui();
        let screen = render(&mut tui);
        assert!(screen.contains("code-route"));
        assert!(screen.contains("Panneaux"));
        assert!(screen.contains("Open module"));
    }

    #[test]
    fn sign_details_show_exam_tip() {
        let mut tui = tui();
        tui.run_intent(code_route::Intent::Open(Screen::Signs)).unwrap();
        let screen = render(&mut tui);
        assert!(screen.contains("Exam tip: Trois secondes"));
        assert!(screen.contains("[m] Mark learned") || screen.contains("[m/Enter] Mark learned"));
    }

    #[test]
    fn empty_quiz_renders_empty_state() {
        let mut tui = tui();
        tui.run_intent(code_route::Intent::Open(Screen::Quiz)).unwrap();
        let screen = render(&mut tui);
        assert!(screen.contains("No questions available"));
    }
}
