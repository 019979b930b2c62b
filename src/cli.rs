use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;

use chrono::NaiveDate;
use getopts::{Matches, Options};
use tokio::time::Duration;

use crate::grid::{Day, Slot};
use crate::model::{Id, Status};

const DEFAULT_BACKEND: &str = "http://localhost:8080";
const DEFAULT_CREDENTIALS: &str = ".edt-credentials.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
    Html,
    Ics,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login {
        token: String,
        username: String,
        role: String,
    },
    Logout,
    Classes,
    Show {
        class_id: Id,
    },
    References {
        class_id: Id,
    },
    Add {
        class_id: Id,
        day: Day,
        slot: Slot,
        refs: Option<(Id, Id, Id)>,
        duplicate: bool,
        status: Option<Status>,
    },
    Remove {
        class_id: Id,
        session_id: Id,
    },
    Generate {
        class_id: Id,
        week_start: NaiveDate,
    },
    Serve,
}

#[derive(Debug, Clone)]
pub struct Args {
    pub backend: String,
    pub credentials: PathBuf,
    pub address: SocketAddr,
    pub enable_cache: bool,
    pub cache_ttl: Duration,
    pub format: Format,
    pub assume_yes: bool,
    pub command: Command,
}

fn opts() -> Options {
    let mut opts = Options::new();
    opts.optflag(
        "h",
        "help",
        concat!("Print the help output of ", env!("CARGO_PKG_NAME")),
    );
    opts.optopt(
        "b",
        "backend",
        "Base URL of the absence-management backend [Default: $EDT_BACKEND or http://localhost:8080]",
        "URL",
    );
    opts.optopt(
        "C",
        "credentials",
        "File holding the login token [Default: $EDT_CREDENTIALS or .edt-credentials.json]",
        "PATH",
    );
    opts.optopt(
        "a",
        "address",
        "Socket address (IP and port) to listen on with `serve` [Default: 127.0.0.1:3000]",
        "SOCKET_ADDRESS",
    );
    opts.optflag(
        "c",
        "enable-cache",
        "Enable caching of reference lists with `serve` [Default: false]",
    );
    opts.optopt(
        "t",
        "cache-ttl",
        "Time-to-live for cached reference lists [Default: 300]",
        "SECONDS",
    );
    opts.optopt(
        "f",
        "format",
        "Output format of `show`: text, json, html or ics [Default: text]",
        "FORMAT",
    );
    opts.optflag("d", "duplicate", "With `add`: reuse the day's latest course, teacher and room");
    opts.optopt("s", "status", "With `add`: PLANIFIEE, EFFECTUEE, ANNULEE or REPORTEE", "STATUS");
    opts.optflag("y", "yes", "Do not ask before removing a session");
    opts
}

fn usage(opts: &Options) -> String {
    let brief = format!(
        "Usage: {} [OPTIONS] COMMAND\n\n\
         Commands:\n    \
         login TOKEN USERNAME ROLE\n    \
         logout\n    \
         classes\n    \
         show CLASS\n    \
         references CLASS\n    \
         add CLASS DAY SLOT [COURSE TEACHER ROOM]\n    \
         remove CLASS SESSION\n    \
         generate CLASS MONDAY\n    \
         serve",
        env!("CARGO_PKG_NAME")
    );
    opts.usage(&brief)
}

fn fail(message: impl AsRef<str>) -> ! {
    eprintln!("{}", message.as_ref());
    process::exit(1);
}

fn id(raw: &str, what: &str) -> Result<Id, String> {
    raw.parse()
        .map_err(|err| format!("Provided value for {what} is invalid: {err}"))
}

fn parse_command(free: &[String], matches: &Matches) -> Result<Command, String> {
    let arg = |index: usize, what: &str| {
        free.get(index)
            .map(String::as_str)
            .ok_or_else(|| format!("Missing argument {what}"))
    };

    let Some(name) = free.first() else {
        return Err("Missing command".into());
    };

    let command = match name.as_str() {
        "login" => Command::Login {
            token: arg(1, "TOKEN")?.to_string(),
            username: arg(2, "USERNAME")?.to_string(),
            role: arg(3, "ROLE")?.to_string(),
        },
        "logout" => Command::Logout,
        "classes" => Command::Classes,
        "show" => Command::Show {
            class_id: id(arg(1, "CLASS")?, "CLASS")?,
        },
        "references" => Command::References {
            class_id: id(arg(1, "CLASS")?, "CLASS")?,
        },
        "add" => {
            let refs = match free.len() {
                4 => None,
                7 => Some((
                    id(&free[4], "COURSE")?,
                    id(&free[5], "TEACHER")?,
                    id(&free[6], "ROOM")?,
                )),
                _ => return Err("`add` takes CLASS DAY SLOT and optionally COURSE TEACHER ROOM".into()),
            };

            let status = match matches.opt_str("status") {
                Some(raw) => Some(
                    Status::from_wire_name(&raw)
                        .ok_or_else(|| format!("Provided value for option 'status' is invalid: {raw}"))?,
                ),
                None => None,
            };

            Command::Add {
                class_id: id(arg(1, "CLASS")?, "CLASS")?,
                day: arg(2, "DAY")?.parse()?,
                slot: arg(3, "SLOT")?.parse()?,
                refs,
                duplicate: matches.opt_present("duplicate"),
                status,
            }
        }
        "remove" => Command::Remove {
            class_id: id(arg(1, "CLASS")?, "CLASS")?,
            session_id: id(arg(2, "SESSION")?, "SESSION")?,
        },
        "generate" => Command::Generate {
            class_id: id(arg(1, "CLASS")?, "CLASS")?,
            week_start: NaiveDate::parse_from_str(arg(2, "MONDAY")?, "%Y-%m-%d")
                .map_err(|err| format!("Provided value for MONDAY is invalid: {err}"))?,
        },
        "serve" => Command::Serve,
        other => return Err(format!("Unknown command `{other}`")),
    };

    Ok(command)
}

pub fn parse(args: Vec<String>) -> Args {
    let opts = opts();

    let matches = match opts.parse(args.iter().skip(1)) {
        Ok(matches) => matches,
        Err(err) => fail(err.to_string()),
    };

    if matches.opt_present("help") {
        println!("{}", usage(&opts));
        process::exit(0);
    }

    let command = parse_command(&matches.free, &matches)
        .unwrap_or_else(|err| fail(format!("{err}\n\n{}", usage(&opts))));

    let backend = matches
        .opt_str("backend")
        .or_else(|| env::var("EDT_BACKEND").ok())
        .unwrap_or_else(|| DEFAULT_BACKEND.to_string());

    let credentials = matches
        .opt_str("credentials")
        .or_else(|| env::var("EDT_CREDENTIALS").ok())
        .map_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS), PathBuf::from);

    let address = match matches.opt_get_default("address", SocketAddr::from(([127, 0, 0, 1], 3000)))
    {
        Ok(address) => address,
        Err(err) => fail(format!("Provided value for option 'address' is invalid: {err}")),
    };

    let enable_cache = matches.opt_present("enable-cache");

    let cache_ttl = match matches.opt_get_default("cache-ttl", 300) {
        Ok(secs) => Duration::from_secs(secs),
        Err(err) => fail(format!("Provided value for option 'cache-ttl' is invalid: {err}")),
    };

    let format = match matches.opt_str("format").as_deref() {
        None | Some("text") => Format::Text,
        Some("json") => Format::Json,
        Some("html") => Format::Html,
        Some("ics") => Format::Ics,
        Some(other) => fail(format!("Provided value for option 'format' is invalid: {other}")),
    };

    Args {
        backend,
        credentials,
        address,
        enable_cache,
        cache_ttl,
        format,
        assume_yes: matches.opt_present("yes"),
        command,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::SLOTS;

    fn command(line: &str) -> Result<Command, String> {
        let opts = opts();
        let matches = opts.parse(line.split_whitespace()).unwrap();
        parse_command(&matches.free, &matches)
    }

    #[test]
    fn parses_new_session() {
        assert_eq!(
            command("add 3 monday 08:00-09:00 7 3 5 --status ANNULEE"),
            Ok(Command::Add {
                class_id: 3,
                day: Day::Monday,
                slot: SLOTS[0],
                refs: Some((7, 3, 5)),
                duplicate: false,
                status: Some(Status::Cancelled),
            })
        );
    }

    #[test]
    fn parses_duplicate_session() {
        let Ok(Command::Add { refs, duplicate, .. }) = command("add 3 FRIDAY 14:00-15:00 -d") else {
            panic!("duplicate add was rejected");
        };
        assert_eq!(refs, None);
        assert!(duplicate);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(command("add 3 SUNDAY 08:00-09:00").is_err());
        assert!(command("add 3 MONDAY 12:00-13:00").is_err());
        assert!(command("add 3 MONDAY 08:00-09:00 7 3").is_err());
        assert!(command("remove 3").is_err());
        assert!(command("frobnicate").is_err());
        assert!(command("").is_err());
    }

    #[test]
    fn parses_generate() {
        assert_eq!(
            command("generate 2 2024-09-02"),
            Ok(Command::Generate {
                class_id: 2,
                week_start: NaiveDate::from_ymd_opt(2024, 9, 2).unwrap(),
            })
        );
    }
}
