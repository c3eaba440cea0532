pub mod actor;
pub mod cinema_hall;
pub mod genre;
pub mod movie;
pub mod movie_session;
pub mod order;
pub mod ticket;
pub mod user;

pub use actor::Actor;
pub use cinema_hall::{CinemaHall, SeatGrid};
pub use genre::Genre;
pub use movie::{Movie, MovieFilter, MovieSummary};
pub use movie_session::{MovieSession, MovieSessionDetail, MovieSessionSummary, SessionFilter, TakenPlace};
pub use order::{Order, OrderDetail, TicketDetail};
pub use ticket::Ticket;
pub use user::User;

/// ILIKE pattern matching `needle` anywhere, with wildcards in it escaped.
pub(crate) fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
