//! Alarm management commands for CLI.

use std::path::{Path, PathBuf};

use chrono::{NaiveTime, Timelike};
use clap::Subcommand;
use wakealarm_core::alarm::codec;
use wakealarm_core::calendar::{meridian, Day};
use wakealarm_core::{Alarm, AlarmEdit, Config, Database, DaySet, MediaType};

use super::{now, print_json, service, CommandResult};

#[derive(Subcommand)]
pub enum AlarmAction {
    /// Create a new alarm
    Add {
        /// Time to ring at, 24-hour "HH:MM"
        #[arg(value_parser = parse_time)]
        time: NaiveTime,
        /// Days: "weekdays", "weekend", "everyday" or a list like "mon,wed,fri"
        #[arg(long, value_parser = parse_days)]
        days: Option<DaySet>,
        /// Keep ringing on the selected days instead of switching off after one run
        #[arg(long)]
        repeat: bool,
        /// Vibrate while ringing
        #[arg(long)]
        vibrate: bool,
        /// Label shown when the alarm rings
        #[arg(long)]
        name: Option<String>,
        /// Sound file or directory to play
        #[arg(long)]
        media: Option<PathBuf>,
        /// Volume 0-100
        #[arg(long)]
        volume: Option<u32>,
        /// Speak the time every N minutes while ringing (0 = once)
        #[arg(long)]
        tts: Option<u32>,
        /// Only this NFC tag dismisses the alarm
        #[arg(long)]
        nfc_tag: Option<String>,
        /// Allow dismissing up to N minutes before the alarm rings
        #[arg(long)]
        dismiss_early: Option<u32>,
    },
    /// Change fields of an alarm
    Edit {
        /// Alarm ID
        id: i64,
        #[arg(long, value_parser = parse_time)]
        time: Option<NaiveTime>,
        #[arg(long, value_parser = parse_days)]
        days: Option<DaySet>,
        #[arg(long)]
        repeat: Option<bool>,
        #[arg(long)]
        vibrate: Option<bool>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        media: Option<PathBuf>,
        #[arg(long)]
        volume: Option<u32>,
        #[arg(long)]
        tts: Option<u32>,
        #[arg(long)]
        nfc_tag: Option<String>,
    },
    /// List alarms, ringing ones first
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show the alarm that rings next
    Next {
        #[arg(long)]
        json: bool,
    },
    /// Show alarm details
    Show {
        /// Alarm ID
        id: i64,
        #[arg(long)]
        json: bool,
    },
    /// Switch an alarm on
    Enable {
        /// Alarm ID
        id: i64,
    },
    /// Switch an alarm off
    Disable {
        /// Alarm ID
        id: i64,
    },
    /// Delete an alarm
    Delete {
        /// Alarm ID
        id: i64,
    },
    /// Snooze a ringing alarm
    Snooze {
        /// Alarm ID
        id: i64,
    },
    /// Dismiss a ringing alarm
    Dismiss {
        /// Alarm ID
        id: i64,
        /// Skip the upcoming occurrence before it rings
        #[arg(long)]
        early: bool,
    },
    /// Print an alarm as a portable text blob
    Export {
        /// Alarm ID
        id: i64,
    },
    /// Create an alarm from an exported text blob
    Import {
        /// Output of `alarm export`
        data: String,
    },
}

pub fn run(action: AlarmAction) -> CommandResult {
    let config = Config::load()?;
    let db = Database::open()?;
    let svc = service(&db, &config);
    let use_24_hour = config.display.use_24_hour;
    let now = now();

    match action {
        AlarmAction::Add {
            time,
            days,
            repeat,
            vibrate,
            name,
            media,
            volume,
            tts,
            nfc_tag,
            dismiss_early,
        } => {
            let mut builder = svc.builder(now).time(time.hour(), time.minute());
            if let Some(days) = days {
                builder = builder.days(days);
            }
            if repeat {
                builder = builder.repeat(true);
            }
            if vibrate {
                builder = builder.vibrate(true);
            }
            if let Some(name) = name {
                builder = builder.name(name);
            }
            if let Some(path) = media {
                let (media_type, path, title) = describe_media(&path);
                builder = builder.media(media_type, path, title);
            }
            if let Some(volume) = volume {
                builder = builder.volume(volume);
            }
            if let Some(frequency) = tts {
                builder = builder.tts(true, frequency);
            }
            if let Some(tag) = nfc_tag {
                builder = builder.nfc(true, tag);
            }
            if let Some(minutes) = dismiss_early {
                builder = builder.dismiss_early(true, minutes);
            }

            let (alarm, event) = svc.create(builder.build()?, now)?;
            println!("Alarm created: {}", alarm.id);
            print_json(&event)?;
        }
        AlarmAction::Edit {
            id,
            time,
            days,
            repeat,
            vibrate,
            name,
            media,
            volume,
            tts,
            nfc_tag,
        } => {
            let mut edits = Vec::new();
            if let Some(time) = time {
                edits.push(AlarmEdit::Time {
                    hour: time.hour(),
                    minute: time.minute(),
                });
            }
            edits.extend(days.map(AlarmEdit::Days));
            edits.extend(repeat.map(AlarmEdit::Repeat));
            edits.extend(vibrate.map(AlarmEdit::Vibrate));
            edits.extend(name.map(AlarmEdit::Name));
            if let Some(path) = media {
                let (media_type, path, title) = describe_media(&path);
                edits.push(AlarmEdit::Media {
                    media_type,
                    path,
                    title,
                });
            }
            edits.extend(volume.map(AlarmEdit::Volume));
            if let Some(frequency) = tts {
                edits.push(AlarmEdit::UseTts(true));
                edits.push(AlarmEdit::TtsFrequency(frequency));
            }
            if let Some(tag) = nfc_tag {
                edits.push(AlarmEdit::UseNfc(!tag.is_empty()));
                edits.push(AlarmEdit::NfcTagId(tag));
            }
            if edits.is_empty() {
                return Err("nothing to change; pass at least one field".into());
            }

            let mut alarm = svc.get(id)?;
            for edit in &edits {
                alarm = svc.edit(id, edit, now)?;
            }
            print_json(&alarm)?;
        }
        AlarmAction::List { json } => {
            let alarms = svc.sorted(now)?;
            if json {
                print_json(&alarms)?;
            } else if alarms.is_empty() {
                println!("No alarms.");
            } else {
                println!("{:>4}  {:<8}  {:<20}  {:<8}  NAME", "ID", "TIME", "DAYS", "STATE");
                for alarm in &alarms {
                    println!(
                        "{:>4}  {:<8}  {:<20}  {:<8}  {}",
                        alarm.id,
                        display_time(alarm, use_24_hour),
                        alarm.days.to_string(),
                        state_label(alarm),
                        alarm.name_for_message(40),
                    );
                }
            }
        }
        AlarmAction::Next { json } => {
            let next = svc.next_alarm(now)?.filter(|a| a.is_enabled || a.is_in_use());
            if json {
                print_json(&next)?;
            } else {
                match next {
                    Some(alarm) => println!(
                        "#{} {} {}",
                        alarm.id,
                        alarm.full_time(now, use_24_hour),
                        alarm.name_normalized()
                    ),
                    None => println!("No upcoming alarm."),
                }
            }
        }
        AlarmAction::Show { id, json } => {
            let alarm = svc.get(id)?;
            if json {
                print_json(&alarm)?;
            } else {
                print_details(&alarm, now, use_24_hour);
            }
        }
        AlarmAction::Enable { id } => print_json(&svc.set_enabled(id, true, now)?)?,
        AlarmAction::Disable { id } => print_json(&svc.set_enabled(id, false, now)?)?,
        AlarmAction::Delete { id } => print_json(&svc.delete(id)?)?,
        AlarmAction::Snooze { id } => print_json(&svc.snooze(id, now)?)?,
        AlarmAction::Dismiss { id, early } => {
            if early {
                let alarm = svc.get(id)?;
                if !alarm.will_alarm_soon(now) {
                    return Err(format!(
                        "alarm {id} is not within its dismiss-early window"
                    )
                    .into());
                }
                print_json(&svc.dismiss_early(id, now)?)?;
            } else {
                print_json(&svc.dismiss(id, now)?)?;
            }
        }
        AlarmAction::Export { id } => {
            let alarm = svc.get(id)?;
            println!("{}", codec::encode_text(&alarm));
        }
        AlarmAction::Import { data } => {
            let decoded = codec::decode_text(data.trim())?;
            let (alarm, event) = svc.import(&decoded, now)?;
            println!("Alarm imported: {}", alarm.id);
            print_json(&event)?;
        }
    }
    Ok(())
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").map_err(|_| format!("expected HH:MM, got '{s}'"))
}

fn parse_days(s: &str) -> Result<DaySet, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "" | "once" | "none" => Ok(DaySet::none()),
        "weekdays" => Ok(DaySet::WEEKDAYS),
        "weekend" | "weekends" => Ok(DaySet::WEEKEND),
        "everyday" | "daily" => Ok(DaySet::EVERYDAY),
        list => list.split(',').map(str::parse::<Day>).collect(),
    }
}

/// Media type, path and title for a file or directory given on the command line.
fn describe_media(path: &Path) -> (MediaType, String, String) {
    let media_type = if path.is_dir() {
        MediaType::Directory
    } else {
        MediaType::File
    };
    let title = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    (media_type, path.to_string_lossy().into_owned(), title)
}

fn display_time(alarm: &Alarm, use_24_hour: bool) -> String {
    let clock = alarm.clock_time(use_24_hour);
    if use_24_hour {
        clock
    } else {
        format!("{clock} {}", meridian(alarm.hour))
    }
}

fn state_label(alarm: &Alarm) -> &'static str {
    if alarm.is_snoozed() {
        "snoozed"
    } else if alarm.is_active {
        "ringing"
    } else if alarm.is_enabled {
        "on"
    } else {
        "off"
    }
}

fn print_details(alarm: &Alarm, now: chrono::NaiveDateTime, use_24_hour: bool) {
    println!("Alarm {}", alarm.id);
    println!("  time:     {}", display_time(alarm, use_24_hour));
    println!("  days:     {}", alarm.days);
    println!("  repeat:   {}", alarm.repeat);
    println!("  state:    {}", state_label(alarm));
    if alarm.is_enabled || alarm.is_in_use() {
        println!("  next:     {}", alarm.full_time(now, use_24_hour));
    }
    if !alarm.name.is_empty() {
        println!("  name:     {}", alarm.name_normalized());
    }
    if alarm.has_media() {
        println!("  media:    {}", alarm.media_path);
    }
    println!("  volume:   {}", alarm.volume);
    println!("  vibrate:  {}", alarm.vibrate);
    if alarm.use_nfc {
        let tag = if alarm.nfc_tag_id.is_empty() {
            "any tag"
        } else {
            alarm.nfc_tag_id.as_str()
        };
        println!("  nfc:      {tag}");
    }
    if alarm.use_tts {
        println!("  speak:    every {} min", alarm.tts_frequency);
    }
    if alarm.is_snoozed() {
        println!("  snoozes:  {}", alarm.snooze_count);
    }
}
