use std::error::Error;
use std::io;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use crossterm::event::{self, Event as CEvent, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, ExecutableCommand};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use ratatui::{Frame, Terminal};

use crate::domain::{
	DayRecord, DayTimeline, Task, TagRegistry, format_clock, format_duration, height_fraction,
};
use crate::storage::TimelineStore;

// Render refresh rate only; stored data never depends on it.
const TICK_INTERVAL_MS: u64 = 500;

const FALLBACK_BLOCK_COLOR: Color = Color::DarkGray;
const HIGHLIGHT_BACKGROUND_COLOR: Color = Color::Rgb(42, 45, 52);
const TAG_PALETTE: [&str; 12] = [
	"#e05252",
	"#e08a3c",
	"#e0c94a",
	"#8bc34a",
	"#4caf7d",
	"#3fb5b5",
	"#4a90d9",
	"#6a6fdb",
	"#9b59d0",
	"#d05fa2",
	"#8d6e63",
	"#7f8c9b",
];

pub fn run_dashboard(
	registry: &mut TagRegistry,
	timeline: &mut DayTimeline,
	store: &dyn TimelineStore,
) -> Result<(), Box<dyn Error>> {
	enable_raw_mode()?;
	let mut stdout = io::stdout();
	stdout.execute(EnterAlternateScreen)?;
	let backend = CrosstermBackend::new(stdout);
	let mut terminal = Terminal::new(backend)?;

	let result = run_event_loop(&mut terminal, registry, timeline, store);

	disable_raw_mode()?;
	execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
	terminal.show_cursor()?;

	result
}

fn run_event_loop(
	terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
	registry: &mut TagRegistry,
	timeline: &mut DayTimeline,
	store: &dyn TimelineStore,
) -> Result<(), Box<dyn Error>> {
	let mut app = App::default();

	loop {
		let now = Utc::now();
		app.clamp_selection(timeline);
		terminal.draw(|frame| draw_dashboard(frame, &app, registry, timeline, now))?;

		if event::poll(StdDuration::from_millis(TICK_INTERVAL_MS))? {
			if let CEvent::Key(key) = event::read()? {
				if key.kind != KeyEventKind::Press {
					continue;
				}

				let should_quit = match &app.mode {
					InputMode::Prompt(_) => handle_prompt_key(&mut app, key.code, timeline),
					InputMode::TagPicker(_) => {
						handle_picker_key(&mut app, key.code, registry, timeline, store)
					}
					InputMode::Select(_) => {
						handle_select_key(&mut app, key.code, registry, timeline, store)
					}
					InputMode::Normal => handle_normal_key(&mut app, key.code, timeline, store),
				};

				if should_quit {
					break;
				}
			}
		}
	}

	Ok(())
}

fn draw_dashboard(
	frame: &mut Frame,
	app: &App,
	registry: &TagRegistry,
	timeline: &DayTimeline,
	now: DateTime<Utc>,
) {
	let layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Min(12), Constraint::Length(5)])
		.split(frame.area());

	let body = Layout::default()
		.direction(Direction::Horizontal)
		.constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
		.split(layout[0]);

	render_timeline_panel(frame, body[0], app, registry, timeline, now);
	render_day_panel(frame, body[1], registry, timeline, now);
	render_footer(frame, layout[1], app);

	match &app.mode {
		InputMode::TagPicker(picker) => render_tag_picker(frame, registry, picker),
		InputMode::Select(select) => render_select_popup(frame, select),
		InputMode::Normal | InputMode::Prompt(_) => {}
	}
}

fn render_timeline_panel(
	frame: &mut Frame,
	area: Rect,
	app: &App,
	registry: &TagRegistry,
	timeline: &DayTimeline,
	now: DateTime<Utc>,
) {
	let block = Block::default().borders(Borders::ALL).title("Timeline");

	let Some(day) = timeline.active_day() else {
		let empty = Paragraph::new(vec![
			Line::from(""),
			Line::from("(no active day)"),
			Line::from("press s to start one"),
		])
		.block(block);
		frame.render_widget(empty, area);
		return;
	};

	let height = area.height.saturating_sub(2) as usize;
	let width = area.width.saturating_sub(2) as usize;
	let lines = timeline_lines(day, registry, app.selected_task, now, height, width);
	frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn timeline_lines(
	day: &DayRecord,
	registry: &TagRegistry,
	selected_task: Option<usize>,
	now: DateTime<Utc>,
	height: usize,
	width: usize,
) -> Vec<Line<'static>> {
	if day.tasks.is_empty() {
		return vec![
			Line::from(""),
			Line::from(format!("day started {}", format_clock(day.day_start_time))),
			Line::from("(no tasks yet, press n to start one)"),
		];
	}

	// One timestep row above the first task and one below every task.
	let separators = day.tasks.len() + 1;
	let available = height.saturating_sub(separators).max(day.tasks.len());
	let heights = block_rows(day, now, available);

	let mut lines = Vec::new();
	lines.push(timestep_line(day.tasks[0].start_time, width));
	for (index, task) in day.tasks.iter().enumerate() {
		let style = tag_block_style(registry.find(&task.tag_id).map(|tag| tag.color.as_str()));
		let is_selected = selected_task == Some(index);
		let block_height = heights[index];
		for row in 0..block_height {
			if row == block_height / 2 {
				let mut label_style = style.add_modifier(Modifier::BOLD);
				if is_selected {
					label_style = label_style.add_modifier(Modifier::UNDERLINED);
				}
				let mut label = task_label(task);
				if is_selected {
					label = format!("> {label} <");
				}
				lines.push(Line::from(Span::styled(center_text(&label, width), label_style)));
			} else {
				lines.push(Line::from(Span::styled(" ".repeat(width), style)));
			}
		}
		lines.push(timestep_line(task.end_time.unwrap_or(now), width));
	}

	lines
}

// Turns per-task height fractions into whole terminal rows. Every task keeps
// at least one row; overshoot from rounding and minimum heights is shaved off
// the tallest block until the stack fits.
fn block_rows(day: &DayRecord, now: DateTime<Utc>, available: usize) -> Vec<usize> {
	let mut rows = day
		.tasks
		.iter()
		.map(|task| ((height_fraction(task, day, now) * available as f64).round() as usize).max(1))
		.collect::<Vec<_>>();

	let floor = rows.len();
	let mut total: usize = rows.iter().sum();
	while total > available.max(floor) {
		let Some((index, tallest)) = rows
			.iter()
			.copied()
			.enumerate()
			.max_by_key(|(_, height)| *height)
		else {
			break;
		};
		if tallest <= 1 {
			break;
		}
		rows[index] -= 1;
		total -= 1;
	}

	rows
}

fn timestep_line(timestamp: DateTime<Utc>, width: usize) -> Line<'static> {
	let text = center_text(&format_clock(timestamp), width);
	Line::from(Span::styled(text, Style::default().bg(Color::Black).fg(Color::White)))
}

fn center_text(text: &str, width: usize) -> String {
	let text_width = text.chars().count();
	if text_width >= width {
		return text.chars().take(width).collect();
	}

	let left = (width - text_width) / 2;
	let right = width - text_width - left;
	format!("{}{}{}", " ".repeat(left), text, " ".repeat(right))
}

fn render_day_panel(
	frame: &mut Frame,
	area: Rect,
	registry: &TagRegistry,
	timeline: &DayTimeline,
	now: DateTime<Utc>,
) {
	let mut lines = Vec::new();
	match timeline.active_day() {
		None => {
			lines.push(Line::from("No active day"));
		}
		Some(day) => {
			lines.push(Line::from(format!("Day {}", day.date_key())));
			lines.push(Line::from(format!(
				"started {} | elapsed {}",
				format_clock(day.day_start_time),
				format_duration(day.span(now))
			)));
			lines.push(Line::from(format!("tasks: {}", day.tasks.len())));
			lines.push(Line::from(""));
			match day.current_task() {
				Some(task) => {
					lines.push(Line::from(vec![
						Span::raw("current: "),
						Span::styled(task_label(task), Style::default().add_modifier(Modifier::BOLD)),
					]));
					let tag_name = registry
						.find(&task.tag_id)
						.map(|tag| tag.name.clone())
						.unwrap_or_else(|| "unknown tag".to_string());
					lines.push(Line::from(format!(
						"  {} | running {}",
						tag_name,
						format_duration(task.span(now))
					)));
					if !task.description.is_empty() {
						lines.push(Line::from(format!("  {}", task.description)));
					}
				}
				None => lines.push(Line::from("no task running")),
			}
		}
	}

	lines.push(Line::from(""));
	lines.push(Line::from("Tags"));
	if registry.all().is_empty() {
		lines.push(Line::from("(none yet)"));
	} else {
		for tag in registry.all() {
			lines.push(Line::from(vec![
				Span::styled("  ", tag_block_style(Some(tag.color.as_str()))),
				Span::raw(format!(" {}", tag.name)),
			]));
		}
	}

	let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Day"));
	frame.render_widget(panel, area);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
	let footer_lines = match &app.mode {
		InputMode::Normal => vec![
			Line::from("s start day | e end day | n task | j/k select block | Enter edit selected | q quit"),
			Line::from(app.status.clone()),
		],
		InputMode::Prompt(prompt) => vec![
			Line::from(prompt.title.clone()),
			Line::from(format!("> {}", prompt.input)),
			Line::from("Enter submit | Esc cancel"),
		],
		InputMode::TagPicker(_) => vec![
			Line::from("type to search | Up/Down move | Enter choose | Tab new tag | Esc cancel"),
			Line::from(app.status.clone()),
		],
		InputMode::Select(select) => vec![
			Line::from(select.title.clone()),
			Line::from("j/k or arrows move | Enter choose | Esc cancel"),
		],
	};

	let footer = Paragraph::new(footer_lines)
		.block(Block::default().borders(Borders::ALL).title("Shortcuts"));
	frame.render_widget(footer, area);
}

fn render_tag_picker(frame: &mut Frame, registry: &TagRegistry, picker: &TagPickerState) {
	let area = centered_rect(52, 55, frame.area());
	frame.render_widget(Clear, area);

	let matches = registry.search(&picker.term).collect::<Vec<_>>();
	let items = if matches.is_empty() {
		vec![ListItem::new("(no matching tags: Tab creates one)")]
	} else {
		matches
			.iter()
			.map(|tag| {
				ListItem::new(Line::from(vec![
					Span::styled("  ", tag_block_style(Some(tag.color.as_str()))),
					Span::raw(format!(" {}", tag.name)),
				]))
			})
			.collect::<Vec<_>>()
	};

	let title = if picker.term.is_empty() {
		format!("Select tag ({} total)", matches.len())
	} else {
		format!("Select tag '{}' ({} matching)", picker.term, matches.len())
	};
	let list = List::new(items)
		.block(Block::default().borders(Borders::ALL).title(title))
		.highlight_symbol(">> ")
		.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR));

	let mut state = ListState::default();
	if !matches.is_empty() {
		state.select(Some(picker.selected.min(matches.len() - 1)));
	}
	frame.render_stateful_widget(list, area, &mut state);
}

fn render_select_popup(frame: &mut Frame, select: &SelectState) {
	let area = centered_rect(52, 45, frame.area());
	frame.render_widget(Clear, area);

	let items = if select.options.is_empty() {
		vec![ListItem::new("(no choices)")]
	} else {
		select
			.options
			.iter()
			.map(|option| ListItem::new(option.label.clone()).style(option.style))
			.collect::<Vec<_>>()
	};

	let list = List::new(items)
		.block(Block::default().borders(Borders::ALL).title(select.title.clone()))
		.highlight_symbol(">> ")
		.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR));

	let mut state = ListState::default();
	if !select.options.is_empty() {
		state.select(Some(select.selected.min(select.options.len() - 1)));
	}
	frame.render_stateful_widget(list, area, &mut state);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
	let popup_layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([
			Constraint::Percentage((100 - percent_y) / 2),
			Constraint::Percentage(percent_y),
			Constraint::Percentage((100 - percent_y) / 2),
		])
		.split(area);
	Layout::default()
		.direction(Direction::Horizontal)
		.constraints([
			Constraint::Percentage((100 - percent_x) / 2),
			Constraint::Percentage(percent_x),
			Constraint::Percentage((100 - percent_x) / 2),
		])
		.split(popup_layout[1])[1]
}

fn handle_normal_key(
	app: &mut App,
	code: KeyCode,
	timeline: &mut DayTimeline,
	store: &dyn TimelineStore,
) -> bool {
	match code {
		KeyCode::Char('q') => true,
		KeyCode::Esc => {
			if app.selected_task.is_some() {
				app.selected_task = None;
				return false;
			}
			true
		}
		KeyCode::Up | KeyCode::Char('k') => {
			app.move_selection(-1, timeline);
			false
		}
		KeyCode::Down | KeyCode::Char('j') => {
			app.move_selection(1, timeline);
			false
		}
		KeyCode::Char('s') => {
			match timeline.start_day(Utc::now()) {
				Ok(day) => {
					let key = day.date_key();
					app.status = match persist_day(store, timeline) {
						Ok(()) => format!("started day {key}"),
						Err(err) => format!("error: {err}"),
					};
					// A fresh day drops straight into the first-task form.
					app.mode = InputMode::Prompt(PromptState::new(
						"Start first task: title",
						PromptKind::TaskTitle { editing_task_id: None },
					));
				}
				Err(err) => app.status = format!("error: {err}"),
			}
			false
		}
		KeyCode::Char('e') => {
			if timeline.active_day().is_some() {
				app.mode = InputMode::Select(build_end_day_select());
			} else {
				app.status = "No active day to end".to_string();
			}
			false
		}
		KeyCode::Char('n') | KeyCode::Enter => {
			open_task_form(app, timeline);
			false
		}
		_ => false,
	}
}

fn open_task_form(app: &mut App, timeline: &DayTimeline) {
	let Some(day) = timeline.active_day() else {
		app.status = "Start a day before logging tasks".to_string();
		return;
	};

	match app.selected_task.and_then(|index| day.tasks.get(index)) {
		Some(task) => {
			app.mode = InputMode::Prompt(PromptState::seeded(
				"Edit task: title",
				task.title.clone(),
				PromptKind::TaskTitle {
					editing_task_id: Some(task.id.clone()),
				},
			));
		}
		None => {
			let title = if day.current_task().is_some() {
				"Start new task: title"
			} else {
				"Start first task: title"
			};
			app.mode = InputMode::Prompt(PromptState::new(
				title,
				PromptKind::TaskTitle { editing_task_id: None },
			));
		}
	}
}

fn handle_prompt_key(app: &mut App, code: KeyCode, timeline: &DayTimeline) -> bool {
	match code {
		KeyCode::Esc => {
			app.mode = InputMode::Normal;
			app.status = "Input cancelled".to_string();
		}
		KeyCode::Backspace => {
			if let InputMode::Prompt(prompt) = &mut app.mode {
				prompt.input.pop();
			}
		}
		KeyCode::Char(value) => {
			if let InputMode::Prompt(prompt) = &mut app.mode {
				prompt.input.push(value);
			}
		}
		KeyCode::Enter => {
			let prompt = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::Prompt(prompt) => prompt,
				_ => return false,
			};

			match submit_prompt(prompt.clone(), timeline) {
				Ok(PromptOutcome::NextPrompt(next)) => app.mode = InputMode::Prompt(next),
				Ok(PromptOutcome::TagPicker(picker)) => app.mode = InputMode::TagPicker(picker),
				Ok(PromptOutcome::Select(select)) => app.mode = InputMode::Select(select),
				Err(err) => {
					app.mode = InputMode::Prompt(prompt);
					app.status = format!("error: {err}");
				}
			}
		}
		_ => {}
	}

	false
}

fn handle_picker_key(
	app: &mut App,
	code: KeyCode,
	registry: &TagRegistry,
	timeline: &mut DayTimeline,
	store: &dyn TimelineStore,
) -> bool {
	match code {
		KeyCode::Esc => {
			app.mode = InputMode::Normal;
			app.status = "Task entry cancelled".to_string();
		}
		KeyCode::Up => {
			if let InputMode::TagPicker(picker) = &mut app.mode {
				picker.selected = picker.selected.saturating_sub(1);
			}
		}
		KeyCode::Down => {
			if let InputMode::TagPicker(picker) = &mut app.mode {
				let count = registry.search(&picker.term).count();
				if count > 0 {
					picker.selected = (picker.selected + 1).min(count - 1);
				}
			}
		}
		KeyCode::Backspace => {
			if let InputMode::TagPicker(picker) = &mut app.mode {
				picker.term.pop();
				picker.selected = 0;
			}
		}
		KeyCode::Tab => {
			let picker = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::TagPicker(picker) => picker,
				_ => return false,
			};
			app.mode = InputMode::Prompt(PromptState::new(
				"New tag: name",
				PromptKind::NewTagName {
					pending: picker.pending,
				},
			));
		}
		KeyCode::Char(value) => {
			if let InputMode::TagPicker(picker) = &mut app.mode {
				picker.term.push(value);
				picker.selected = 0;
			}
		}
		KeyCode::Enter => {
			let picker = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::TagPicker(picker) => picker,
				_ => return false,
			};

			let Some(tag_id) = registry
				.search(&picker.term)
				.nth(picker.selected)
				.map(|tag| tag.id.clone())
			else {
				app.status = "No tag to choose: type to search or press Tab to create one".to_string();
				app.mode = InputMode::TagPicker(picker);
				return false;
			};

			match submit_pending_task(picker.pending.clone(), tag_id, timeline, store) {
				Ok(message) => app.status = message,
				Err(err) => {
					app.mode = InputMode::TagPicker(picker);
					app.status = format!("error: {err}");
				}
			}
		}
		_ => {}
	}

	false
}

fn handle_select_key(
	app: &mut App,
	code: KeyCode,
	registry: &mut TagRegistry,
	timeline: &mut DayTimeline,
	store: &dyn TimelineStore,
) -> bool {
	match code {
		KeyCode::Esc => {
			app.mode = InputMode::Normal;
			app.status = "Selection cancelled".to_string();
		}
		KeyCode::Up | KeyCode::Char('k') => {
			if let InputMode::Select(select) = &mut app.mode {
				select.move_selection(-1);
			}
		}
		KeyCode::Down | KeyCode::Char('j') => {
			if let InputMode::Select(select) = &mut app.mode {
				select.move_selection(1);
			}
		}
		KeyCode::Enter => {
			let select = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::Select(select) => select,
				_ => return false,
			};

			match submit_select(select.clone(), registry, timeline, store) {
				Ok(message) => app.status = message,
				Err(err) => {
					app.mode = InputMode::Select(select);
					app.status = format!("error: {err}");
				}
			}
		}
		_ => {}
	}

	false
}

fn submit_prompt(prompt: PromptState, timeline: &DayTimeline) -> Result<PromptOutcome, String> {
	match prompt.kind {
		PromptKind::TaskTitle { editing_task_id } => {
			let title = prompt.input.trim().to_string();
			let seed = editing_task_id
				.as_deref()
				.and_then(|task_id| task_description(timeline, task_id))
				.unwrap_or_default();
			Ok(PromptOutcome::NextPrompt(PromptState::seeded(
				"Description (optional)",
				seed,
				PromptKind::TaskDescription { editing_task_id, title },
			)))
		}
		PromptKind::TaskDescription { editing_task_id, title } => {
			let description = prompt.input.trim().to_string();
			Ok(PromptOutcome::TagPicker(TagPickerState {
				pending: PendingTask {
					title,
					description,
					editing_task_id,
				},
				term: String::new(),
				selected: 0,
			}))
		}
		PromptKind::NewTagName { pending } => {
			let name = required_text(&prompt.input, "tag name")?;
			Ok(PromptOutcome::Select(build_tag_color_select(pending, name)))
		}
	}
}

fn submit_select(
	select: SelectState,
	registry: &mut TagRegistry,
	timeline: &mut DayTimeline,
	store: &dyn TimelineStore,
) -> Result<String, String> {
	let selected_value = select
		.selected_option()
		.map(|option| option.value.clone())
		.ok_or_else(|| "no option selected".to_string())?;

	match select.kind {
		SelectKind::TagColor { pending, name } => {
			let color = selected_value.ok_or_else(|| "selected color is missing".to_string())?;
			let tag_id = registry
				.create(name, color)
				.map_err(|err| err.to_string())?
				.id
				.clone();
			persist_tags(store, registry)?;
			// The fresh tag is applied straight to the submission that
			// spawned the new-tag flow.
			submit_pending_task(pending, tag_id, timeline, store)
		}
		SelectKind::EndDayConfirm => {
			let action = selected_value
				.as_deref()
				.ok_or_else(|| "selected action is missing".to_string())?;
			if action == "end" {
				end_day(timeline, store)
			} else {
				Ok("End day cancelled".to_string())
			}
		}
	}
}

fn submit_pending_task(
	pending: PendingTask,
	tag_id: String,
	timeline: &mut DayTimeline,
	store: &dyn TimelineStore,
) -> Result<String, String> {
	let editing = pending.editing_task_id.is_some();
	let label = timeline
		.submit_task(
			pending.title,
			pending.description,
			Some(tag_id),
			pending.editing_task_id.as_deref(),
			Utc::now(),
		)
		.map(task_label)
		.map_err(|err| err.to_string())?;
	persist_day(store, timeline)?;

	if editing {
		Ok(format!("updated task: {label}"))
	} else {
		Ok(format!("started task: {label}"))
	}
}

fn end_day(timeline: &mut DayTimeline, store: &dyn TimelineStore) -> Result<String, String> {
	let closed = timeline.end_day(Utc::now()).map_err(|err| err.to_string())?;
	store.save_day(&closed).map_err(|err| err.to_string())?;
	Ok(format!(
		"ended day {} with {} tasks ({})",
		closed.date_key(),
		closed.tasks.len(),
		format_duration(closed.span(Utc::now()))
	))
}

fn persist_day(store: &dyn TimelineStore, timeline: &DayTimeline) -> Result<(), String> {
	match timeline.active_day() {
		Some(day) => store.save_day(day).map_err(|err| err.to_string()),
		None => Ok(()),
	}
}

fn persist_tags(store: &dyn TimelineStore, registry: &TagRegistry) -> Result<(), String> {
	store.save_tags(registry.all()).map_err(|err| err.to_string())
}

fn build_end_day_select() -> SelectState {
	let options = vec![
		SelectOption::new(
			"End day",
			Some("end".to_string()),
			Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
		),
		SelectOption::new("Cancel", Some("cancel".to_string()), Style::default()),
	];

	let mut select = SelectState::new(
		"End the day? The running task closes with it",
		SelectKind::EndDayConfirm,
		options,
	);
	// Cancel is preselected.
	select.selected = 1;
	select
}

fn build_tag_color_select(pending: PendingTask, name: String) -> SelectState {
	let title = format!("Color for '{name}'");
	let options = TAG_PALETTE
		.iter()
		.map(|hex| {
			let swatch = "████████████████".to_string();
			SelectOption::new(swatch, Some((*hex).to_string()), swatch_style(hex))
		})
		.collect::<Vec<_>>();

	SelectState::new(title, SelectKind::TagColor { pending, name }, options)
}

fn task_description(timeline: &DayTimeline, task_id: &str) -> Option<String> {
	timeline
		.active_day()
		.and_then(|day| day.tasks.iter().find(|task| task.id == task_id))
		.map(|task| task.description.clone())
}

fn task_label(task: &Task) -> String {
	if task.title.trim().is_empty() {
		"(untitled)".to_string()
	} else {
		task.title.clone()
	}
}

fn required_text(input: &str, field_name: &str) -> Result<String, String> {
	let value = input.trim();
	if value.is_empty() {
		Err(format!("{field_name} is required"))
	} else {
		Ok(value.to_string())
	}
}

fn swatch_style(hex: &str) -> Style {
	color_from_hex(hex)
		.map(|color| Style::default().fg(color))
		.unwrap_or_default()
}

fn tag_block_style(color: Option<&str>) -> Style {
	let color = color.and_then(color_from_hex).unwrap_or(FALLBACK_BLOCK_COLOR);
	Style::default().bg(color).fg(Color::White)
}

fn color_from_hex(hex: &str) -> Option<Color> {
	let digits = hex.strip_prefix('#')?;
	if digits.len() != 6 || !digits.is_ascii() {
		return None;
	}

	let red = u8::from_str_radix(&digits[0..2], 16).ok()?;
	let green = u8::from_str_radix(&digits[2..4], 16).ok()?;
	let blue = u8::from_str_radix(&digits[4..6], 16).ok()?;
	Some(Color::Rgb(red, green, blue))
}

#[derive(Debug, Clone)]
enum PromptOutcome {
	NextPrompt(PromptState),
	TagPicker(TagPickerState),
	Select(SelectState),
}

#[derive(Debug, Clone)]
struct PendingTask {
	title: String,
	description: String,
	editing_task_id: Option<String>,
}

#[derive(Debug, Clone)]
struct PromptState {
	title: String,
	input: String,
	kind: PromptKind,
}

impl PromptState {
	fn new(title: impl Into<String>, kind: PromptKind) -> Self {
		Self {
			title: title.into(),
			input: String::new(),
			kind,
		}
	}

	fn seeded(title: impl Into<String>, input: impl Into<String>, kind: PromptKind) -> Self {
		Self {
			title: title.into(),
			input: input.into(),
			kind,
		}
	}
}

#[derive(Debug, Clone)]
enum PromptKind {
	TaskTitle {
		editing_task_id: Option<String>,
	},
	TaskDescription {
		editing_task_id: Option<String>,
		title: String,
	},
	NewTagName {
		pending: PendingTask,
	},
}

#[derive(Debug, Clone)]
struct TagPickerState {
	pending: PendingTask,
	term: String,
	selected: usize,
}

#[derive(Debug, Clone)]
struct SelectState {
	title: String,
	options: Vec<SelectOption>,
	selected: usize,
	kind: SelectKind,
}

impl SelectState {
	fn new(title: impl Into<String>, kind: SelectKind, options: Vec<SelectOption>) -> Self {
		Self {
			title: title.into(),
			options,
			selected: 0,
			kind,
		}
	}

	fn move_selection(&mut self, delta: i32) {
		if self.options.is_empty() {
			self.selected = 0;
			return;
		}

		if delta > 0 {
			self.selected = (self.selected + delta as usize).min(self.options.len() - 1);
		} else {
			self.selected = self.selected.saturating_sub(delta.unsigned_abs() as usize);
		}
	}

	fn selected_option(&self) -> Option<&SelectOption> {
		self.options.get(self.selected)
	}
}

#[derive(Debug, Clone)]
struct SelectOption {
	label: String,
	value: Option<String>,
	style: Style,
}

impl SelectOption {
	fn new(label: impl Into<String>, value: Option<String>, style: Style) -> Self {
		Self {
			label: label.into(),
			value,
			style,
		}
	}
}

#[derive(Debug, Clone)]
enum SelectKind {
	TagColor {
		pending: PendingTask,
		name: String,
	},
	EndDayConfirm,
}

#[derive(Debug, Clone)]
enum InputMode {
	Normal,
	Prompt(PromptState),
	TagPicker(TagPickerState),
	Select(SelectState),
}

#[derive(Debug, Clone)]
struct App {
	selected_task: Option<usize>,
	mode: InputMode,
	status: String,
}

impl Default for App {
	fn default() -> Self {
		Self {
			selected_task: None,
			mode: InputMode::Normal,
			status: "Ready".to_string(),
		}
	}
}

impl App {
	fn clamp_selection(&mut self, timeline: &DayTimeline) {
		let task_count = timeline.active_day().map(|day| day.tasks.len()).unwrap_or(0);
		if task_count == 0 {
			self.selected_task = None;
		} else if let Some(index) = self.selected_task {
			self.selected_task = Some(index.min(task_count - 1));
		}
	}

	fn move_selection(&mut self, delta: i32, timeline: &DayTimeline) {
		let task_count = timeline.active_day().map(|day| day.tasks.len()).unwrap_or(0);
		if task_count == 0 {
			self.selected_task = None;
			return;
		}

		let next = match self.selected_task {
			None => {
				if delta > 0 {
					0
				} else {
					task_count - 1
				}
			}
			Some(index) => {
				if delta > 0 {
					(index + delta as usize).min(task_count - 1)
				} else {
					index.saturating_sub(delta.unsigned_abs() as usize)
				}
			}
		};
		self.selected_task = Some(next);
	}
}

pub fn print_timeline(day: &DayRecord, registry: &TagRegistry, now: DateTime<Utc>, rows: usize) {
	println!(
		"day {} ({})",
		day.date_key(),
		if day.is_open() { "open" } else { "closed" }
	);
	if day.tasks.is_empty() {
		println!("(no tasks)");
		return;
	}

	let available = rows.max(day.tasks.len());
	let heights = block_rows(day, now, available);

	println!("{}", format_clock(day.tasks[0].start_time));
	for (task, height) in day.tasks.iter().zip(heights) {
		let tag_name = registry
			.find(&task.tag_id)
			.map(|tag| tag.name.as_str())
			.unwrap_or("unknown tag");
		for row in 0..height {
			if row == height / 2 {
				println!(
					"| {:<28} {} | {}",
					task_label(task),
					format_duration(task.span(now)),
					tag_name
				);
			} else {
				println!("|");
			}
		}
		println!("{}", format_clock(task.end_time.unwrap_or(now)));
	}
}
