//! Schema driven table viewer.
//!
//! Columns are declared once per row type with [`schema::col`], the
//! [`state::TableState`] keeps the interactive sort chain and column
//! visibility, [`sort`] derives the row order and [`cells`] renders each
//! cell according to the column kind.

pub mod cells;
pub mod column;
pub mod controller;
pub mod domain;
pub mod model;
pub mod prompt;
pub mod records;
pub mod resource;
pub mod schema;
pub mod sort;
pub mod state;
pub mod swapi;
pub mod ui;
pub mod value;
