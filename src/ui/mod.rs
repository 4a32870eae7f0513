/// UI module exports
pub mod app;
mod components;
mod import;
mod notification;
mod send;
