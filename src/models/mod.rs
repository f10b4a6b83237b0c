pub mod movie;
pub mod rating;
pub mod snapshot;

pub use movie::{Movie, MovieEntry};
pub use rating::{latest_per_movie, parse_timestamp, RatedMovie, RatingEdge};
pub use snapshot::{GraphSnapshot, RatingLink, UserNode};
