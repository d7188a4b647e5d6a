//! Realtime kanban sync: an authenticated websocket server that keeps every
//! session of a user's board converged, plus the client-side reducer that
//! reconciles optimistic local state with server-confirmed events.

pub mod db;
pub mod event;
pub mod reconcile;
pub mod routes;
pub mod services;
pub mod state;
