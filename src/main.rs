use std::env;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::{bail, Result};
use log::{info, warn};

use edt_proxy::auth::{AuthContext, Credentials, User};
use edt_proxy::backend::{Backend, HttpBackend};
use edt_proxy::board::Board;
use edt_proxy::cache::{self, Cache};
use edt_proxy::cli::{self, Command, Format};
use edt_proxy::dispatch::Dispatcher;
use edt_proxy::editor::{self, DraftEdit, Mode};
use edt_proxy::error::Error;
use edt_proxy::model::SchedulePlan;
use edt_proxy::server::{self, AppState};
use edt_proxy::view::GridView;

fn setup_logging() {
    if env::var("LOG").is_err() {
        env::set_var("LOG", "edt_proxy=info");
    }

    pretty_env_logger::init_custom_env("LOG");
}

fn print_plan(plan: &SchedulePlan, format: Format) -> Result<()> {
    match format {
        Format::Text => print!("{}", GridView::of(plan).to_text()),
        Format::Json => println!("{}", serde_json::to_string_pretty(&GridView::of(plan))?),
        Format::Html => print!("{}", GridView::of(plan).to_html()?),
        Format::Ics => print!("{}", plan.to_ics()),
    }
    Ok(())
}

/// Surfaces whatever the board wants the user to see.
fn report(board: &Board) {
    if let Some(message) = &board.message {
        eprintln!("{message}");
    }
    if let Some(error) = &board.error {
        eprintln!("error: {error}");
    }
}

fn confirm(question: &str) -> Result<bool> {
    eprint!("{question} [y/N] ");
    io::stderr().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes" | "o" | "oui"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::parse(env::args().collect());
    setup_logging();

    match &args.command {
        Command::Login {
            token,
            username,
            role,
        } => {
            let mut auth = AuthContext::at(&args.credentials);
            auth.login(Credentials {
                token: token.clone(),
                user: User {
                    username: username.clone(),
                    role: role.clone(),
                },
            })?;
            info!("Credentials saved to {}", auth.path().display());
            return Ok(());
        }
        Command::Logout => {
            AuthContext::at(&args.credentials).logout()?;
            return Ok(());
        }
        _ => {}
    }

    let auth = AuthContext::init(&args.credentials)?;
    let backend = HttpBackend::new(&args.backend, &auth);

    match args.command {
        Command::Classes => {
            let mut dispatcher = Dispatcher::new(backend, &auth);
            dispatcher.load_classes().await;
            report(dispatcher.board());
            for class in &dispatcher.board().classes {
                println!("{}\t{}", class.id, class.label());
            }
        }

        Command::References { class_id } => {
            let references = backend.references(class_id).await?;
            println!("{}", serde_json::to_string_pretty(&references)?);
        }

        Command::Show { class_id } => {
            let mut dispatcher = Dispatcher::new(backend, &auth);
            match dispatcher.load_plan(class_id).await {
                Ok(_) | Err(Error::NoPlan) => {}
                Err(err) => return Err(err.into()),
            }
            report(dispatcher.board());
            if let Some(plan) = &dispatcher.board().plan {
                print_plan(plan, args.format)?;
            }
        }

        Command::Add {
            class_id,
            day,
            slot,
            refs,
            duplicate,
            status,
        } => {
            let mut dispatcher = Dispatcher::new(backend, &auth);
            let plan = dispatcher.load_plan(class_id).await?;
            if duplicate && !editor::has_sessions_on(plan, day) {
                warn!("Nothing to duplicate on {day}, course, teacher and room must be given");
            }

            dispatcher.open_draft(day, slot);
            dispatcher.edit_draft(DraftEdit {
                course_id: refs.map(|refs| refs.0),
                teacher_id: refs.map(|refs| refs.1),
                room_id: refs.map(|refs| refs.2),
                status,
                mode: Some(if duplicate {
                    Mode::DuplicatePrevious
                } else {
                    Mode::New
                }),
                ..DraftEdit::default()
            });

            let outcome = dispatcher.add_session().await.map(|_| ());
            report(dispatcher.board());
            outcome?;

            if let Some(plan) = &dispatcher.board().plan {
                print_plan(plan, args.format)?;
            }
        }

        Command::Remove {
            class_id,
            session_id,
        } => {
            let mut dispatcher = Dispatcher::new(backend, &auth);
            dispatcher.load_plan(class_id).await?;
            dispatcher.request_removal(session_id);

            if dispatcher.board().pending_removal.is_none() {
                report(dispatcher.board());
                bail!("removal refused");
            }

            if !args.assume_yes && !confirm("Êtes-vous sûr de vouloir supprimer cette séance ?")? {
                dispatcher.decline_removal();
                return Ok(());
            }

            let outcome = dispatcher.confirm_removal().await.map(|_| ());
            report(dispatcher.board());
            outcome?;
        }

        Command::Generate {
            class_id,
            week_start,
        } => {
            let mut dispatcher = Dispatcher::new(backend, &auth);
            dispatcher.select_class(class_id).await;
            let plan = dispatcher.generate_weekly(week_start).await?.clone();
            report(dispatcher.board());
            print_plan(&plan, args.format)?;
        }

        Command::Serve => {
            let state = AppState {
                backend: Arc::new(backend),
                auth: Arc::new(auth),
                references: Cache::new(cache::Config {
                    enabled: args.enable_cache,
                    ttl: args.cache_ttl,
                }),
            };

            info!("Proxying {}", args.backend);
            server::serve(args.address, state).await?;
        }

        Command::Login { .. } | Command::Logout => unreachable!(),
    }

    Ok(())
}
