mod archive;
mod config;
mod logbook;
mod mounts;
mod notify;
mod paths;
mod pipeline;
mod sync;

use chrono::{Local, NaiveDate};
use clap::Parser;
use colored::Colorize;
use logbook::{Level, RunLog};
use notify::Mailer;
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Year to archive (e.g. 2021); omit the date for yesterday's daily run
    year: Option<i32>,

    /// Month (1-12)
    month: Option<u32>,

    /// Day of month
    day: Option<u32>,

    /// Scratch directory where archives are staged before upload
    #[arg(long, short = 's', default_value = "/data")]
    scratch: PathBuf,

    /// Send a test email through the relay and exit
    #[arg(long)]
    test_email: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    let mail = config::MailSettings::load();

    if args.test_email {
        test_mail_relay(&mail);
        return;
    }

    // Invalid configuration is the one thing allowed to kill the process.
    let owners = match config::owner_table() {
        Ok(table) => table,
        Err(e) => {
            eprintln!("Configuration error: {e:#}");
            process::exit(1);
        }
    };

    let (date, one_shot) = resolve_run_date(&args);

    let mut log = RunLog::new();
    log.info(format!("Backup run for {date}"));

    let relay = notify::SmtpRelay::new(&mail.relay);
    let counts = pipeline::run(
        date,
        &config::mount_table(),
        &args.scratch,
        &sync::Rclone,
        &relay,
        &owners,
        &mail,
        &mounts::is_live,
        &mut log,
    );

    if one_shot {
        print_console_report(&log);
        if counts.failed > 0 {
            process::exit(1);
        }
    } else {
        let summary = notify::run_summary(&log, date, &mail);
        if let Err(e) = relay.send(&summary) {
            eprintln!("Failed to send the run summary: {e:#}");
        }
    }
}

/// Picks the date to back up: yesterday for the scheduled run, or the three
/// positional arguments for the manual one-shot. Returns (date, one_shot).
fn resolve_run_date(args: &Args) -> (NaiveDate, bool) {
    match (args.year, args.month, args.day) {
        (None, None, None) => {
            let today = Local::now().date_naive();
            match today.pred_opt() {
                Some(yesterday) => (yesterday, false),
                None => {
                    eprintln!("No previous calendar day exists for {today}");
                    process::exit(1);
                }
            }
        }
        (Some(year), Some(month), Some(day)) => {
            if !(1..=12).contains(&month) {
                eprintln!("Month must be an integer between 1 and 12");
                process::exit(1);
            }
            match NaiveDate::from_ymd_opt(year, month, day) {
                Some(date) => (date, true),
                None => {
                    eprintln!("{year}-{month:02}-{day:02} is not a valid calendar date");
                    process::exit(1);
                }
            }
        }
        _ => {
            eprintln!("Provide year, month and day together, or none for the daily run");
            process::exit(1);
        }
    }
}

fn print_console_report(log: &RunLog) {
    println!("\n{}", "=== Backup Run Report ===".cyan());
    for event in log.events() {
        let line = format!("{} {}", event.at.format("%H:%M:%S"), event.message);
        match event.level {
            Level::Info => println!("{line}"),
            Level::Error => println!("{}", line.red()),
        }
    }
    if log.error_count() == 0 {
        println!("{}", "Run completed without errors.".green());
    } else {
        println!(
            "{}",
            format!("Run completed with {} error(s).", log.error_count()).yellow()
        );
    }
}

fn test_mail_relay(mail: &config::MailSettings) {
    println!("Testing mail delivery through {}...", mail.relay);

    let probe = notify::OutboundMail {
        from: mail.sender.clone(),
        to: mail.ops.clone(),
        cc: None,
        subject: "[bella_backup] Test email".to_string(),
        body: format!(
            "This is a test email from bella_backup.\n\nSent at: {}\n\nIf you received this, summary and owner notices will go through.",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ),
    };

    match notify::SmtpRelay::new(&mail.relay).send(&probe) {
        Ok(()) => println!("Test email sent. Check the inbox at: {}", mail.ops),
        Err(e) => {
            eprintln!("Failed to send test email: {e:#}");
            process::exit(1);
        }
    }
}
