//! Weekly schedule ("emploi du temps") front end for the absence-management
//! backend: lays a class's sessions out on a day × slot grid, merges
//! contiguous identical sessions, and submits additions and removals.

pub mod auth;
pub mod backend;
pub mod board;
pub mod cache;
pub mod cli;
pub mod dispatch;
pub mod editor;
pub mod error;
pub mod grid;
pub mod model;
pub mod server;
pub mod view;

mod ics;

pub use error::{Error, Result};
pub use grid::{build_grid, build_merge_plan, Day, Grid, Merge, MergePlan, Slot, SLOTS};
pub use model::{SchedulePlan, Session, Status};
