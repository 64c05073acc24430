mod datadir;
mod domain;
mod storage;
mod ui;

use std::error::Error;
use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};

use crate::datadir::resolve_data_dir;
use crate::domain::{DayTimeline, TagRegistry, format_clock, format_duration};
use crate::storage::{FileStore, StorageError, TimelineStore};
use crate::ui::{print_timeline, run_dashboard};

#[derive(Debug, Parser)]
#[command(name = "dayline", about = "Terminal-first day timeline tracker")]
struct Cli {
	#[arg(long)]
	data_dir: Option<PathBuf>,
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
	Dashboard,
	StartDay,
	EndDay,
	Task {
		#[arg(long)]
		title: String,
		#[arg(long, default_value = "")]
		description: String,
		#[arg(long)]
		tag: String,
	},
	Edit {
		#[arg(long)]
		task: String,
		#[arg(long)]
		title: String,
		#[arg(long, default_value = "")]
		description: String,
		#[arg(long)]
		tag: String,
	},
	AddTag {
		#[arg(long)]
		name: String,
		#[arg(long)]
		color: String,
	},
	Tags {
		#[arg(long)]
		search: Option<String>,
	},
	Status,
	Timeline {
		#[arg(long, default_value_t = 24)]
		rows: usize,
		#[arg(long)]
		day: Option<String>,
	},
	Days {
		#[arg(long, default_value_t = 20)]
		limit: usize,
	},
}

fn main() {
	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();
	let store = FileStore::new(resolve_data_dir(cli.data_dir));
	let mut registry = TagRegistry::from_saved(store.load_tags()?);
	let mut timeline = DayTimeline::resume(store.load_open_day()?);

	match cli.command.unwrap_or(Command::Dashboard) {
		Command::Dashboard => {
			run_dashboard(&mut registry, &mut timeline, &store)?;
		}
		Command::StartDay => {
			let key = timeline.start_day(Utc::now())?.date_key();
			save_active_day(&store, &timeline)?;
			println!("started day {key}");
		}
		Command::EndDay => {
			let closed = timeline.end_day(Utc::now())?;
			store.save_day(&closed)?;
			println!(
				"ended day {} with {} tasks ({})",
				closed.date_key(),
				closed.tasks.len(),
				format_duration(closed.span(Utc::now()))
			);
		}
		Command::Task {
			title,
			description,
			tag,
		} => {
			let tag_id = resolve_tag(&registry, &tag)?;
			let started = timeline
				.submit_task(title, description, Some(tag_id), None, Utc::now())?
				.title
				.clone();
			save_active_day(&store, &timeline)?;
			println!("started task: {started}");
		}
		Command::Edit {
			task,
			title,
			description,
			tag,
		} => {
			let tag_id = resolve_tag(&registry, &tag)?;
			let updated = timeline
				.submit_task(title, description, Some(tag_id), Some(task.as_str()), Utc::now())?
				.title
				.clone();
			save_active_day(&store, &timeline)?;
			println!("updated task: {updated}");
		}
		Command::AddTag { name, color } => {
			let tag = registry.create(name, color)?;
			let line = format!("created tag {} ({})", tag.id, tag.name);
			store.save_tags(registry.all())?;
			println!("{line}");
		}
		Command::Tags { search } => {
			let term = search.unwrap_or_default();
			let mut empty = true;
			for tag in registry.search(&term) {
				empty = false;
				println!("{} | {} | {}", tag.id, tag.color, tag.name);
			}
			if empty {
				println!("no matching tags");
			}
		}
		Command::Status => {
			print_status(&registry, &timeline);
		}
		Command::Timeline { rows, day } => {
			let record = match day {
				Some(raw) => {
					let date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d")?;
					store.load_day(date)?
				}
				None => timeline.active_day().cloned(),
			};

			match record {
				Some(record) => print_timeline(&record, &registry, Utc::now(), rows),
				None => println!("no day to show"),
			}
		}
		Command::Days { limit } => {
			let days = store.list_days()?;
			if days.is_empty() {
				println!("no recorded days");
				return Ok(());
			}

			for date in days.iter().rev().take(limit) {
				if let Some(day) = store.load_day(*date)? {
					println!(
						"{} | {} tasks | {}",
						day.date_key(),
						day.tasks.len(),
						if day.is_open() { "open" } else { "closed" }
					);
				}
			}
		}
	}

	Ok(())
}

fn save_active_day(store: &FileStore, timeline: &DayTimeline) -> Result<(), StorageError> {
	match timeline.active_day() {
		Some(day) => store.save_day(day),
		None => Ok(()),
	}
}

fn resolve_tag(registry: &TagRegistry, reference: &str) -> Result<String, Box<dyn Error>> {
	match registry.resolve(reference) {
		Some(tag) => Ok(tag.id.clone()),
		None => Err(format!("tag not found: {reference} (see `dayline tags`)").into()),
	}
}

fn print_status(registry: &TagRegistry, timeline: &DayTimeline) {
	let now = Utc::now();
	let Some(day) = timeline.active_day() else {
		println!("no active day");
		return;
	};

	println!(
		"day {} open since {} ({})",
		day.date_key(),
		format_clock(day.day_start_time),
		format_duration(day.span(now))
	);

	match timeline.current_task() {
		Some(task) => {
			let tag = registry
				.find(&task.tag_id)
				.map(|tag| tag.name.clone())
				.unwrap_or_else(|| "unknown tag".to_string());
			println!(
				"current task: {} [{}] running {}",
				task.title,
				tag,
				format_duration(task.span(now))
			);
		}
		None => println!("no task running yet"),
	}
}
