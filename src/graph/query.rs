//! Statement construction for the graph store.
//!
//! Record references are only interpolated after passing [`NodeRef`]
//! validation; free text (director names) is always sent as a bound
//! parameter. Traversal text and the keys the store uses for nested results
//! both come from the same [`TraversalPath`], so they cannot drift apart.

use std::{collections::BTreeMap, fmt::Display};

use super::node_ref::{NodeRef, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Out,
    In,
}

/// One edge or table step of a traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hop {
    direction: Direction,
    name: &'static str,
}

impl Hop {
    pub const fn out(name: &'static str) -> Self {
        Self {
            direction: Direction::Out,
            name,
        }
    }

    pub const fn inbound(name: &'static str) -> Self {
        Self {
            direction: Direction::In,
            name,
        }
    }

    /// The literal token, e.g. `->rated` or `<-movie`.
    pub fn token(&self) -> String {
        let arrow = match self.direction {
            Direction::Out => "->",
            Direction::In => "<-",
        };
        format!("{}{}", arrow, self.name)
    }
}

/// A multi-hop walk across typed graph edges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversalPath(&'static [Hop]);

impl TraversalPath {
    /// Tokens in query order; these are also the keys of the nested result.
    pub fn segments(&self) -> Vec<String> {
        self.0.iter().map(Hop::token).collect()
    }
}

impl Display for TraversalPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for hop in self.0 {
            f.write_str(&hop.token())?;
        }
        Ok(())
    }
}

/// user → rated → movie
pub const RATED_MOVIES: TraversalPath = TraversalPath(&[Hop::out("rated"), Hop::out("movie")]);

/// user → rated → movie → belongs_to → genre
pub const RATED_GENRES: TraversalPath = TraversalPath(&[
    Hop::out("rated"),
    Hop::out("movie"),
    Hop::out("belongs_to"),
    Hop::out("genre"),
]);

/// genre ← belongs_to ← movie
pub const GENRE_MOVIES: TraversalPath =
    TraversalPath(&[Hop::inbound("belongs_to"), Hop::inbound("movie")]);

/// movie → belongs_to → genre
pub const MOVIE_GENRES: TraversalPath =
    TraversalPath(&[Hop::out("belongs_to"), Hop::out("genre")]);

/// movie ← rated ← user → rated → movie
pub const CO_RATED_MOVIES: TraversalPath = TraversalPath(&[
    Hop::inbound("rated"),
    Hop::inbound("user"),
    Hop::out("rated"),
    Hop::out("movie"),
]);

/// Field alias used by statements that project a traversal as a list
pub const MOVIES_FIELD: &str = "movies";
pub const GENRES_FIELD: &str = "genres";

/// A single query statement plus its bound parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Statement {
    text: String,
    params: BTreeMap<String, String>,
}

impl Statement {
    fn new(text: String) -> Self {
        Self {
            text,
            params: BTreeMap::new(),
        }
    }

    fn bind(mut self, name: &str, value: impl Into<String>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Parameters referenced as `$name` in the text
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Movie references a user has rated, unfetched.
    pub fn rated_movie_refs(user: &NodeRef) -> Self {
        debug_assert_eq!(user.table(), Table::User);
        Self::new(format!(
            "SELECT {} AS {} FROM {};",
            RATED_MOVIES, MOVIES_FIELD, user
        ))
    }

    /// Full movie records a user has rated.
    pub fn rated_movies(user: &NodeRef) -> Self {
        debug_assert_eq!(user.table(), Table::User);
        Self::new(format!(
            "SELECT {} AS {field} FROM {} FETCH {field};",
            RATED_MOVIES,
            user,
            field = MOVIES_FIELD
        ))
    }

    /// Genres of every movie a user has rated, keyed by arrow tokens.
    pub fn rated_genres(user: &NodeRef) -> Self {
        debug_assert_eq!(user.table(), Table::User);
        Self::new(format!("SELECT {} FROM {};", RATED_GENRES, user))
    }

    /// Movies belonging to a genre, fetched, keyed by arrow tokens.
    pub fn movies_in_genre(genre: &NodeRef) -> Self {
        debug_assert_eq!(genre.table(), Table::Genre);
        Self::new(format!(
            "SELECT {path} FROM {} FETCH {path};",
            genre,
            path = GENRE_MOVIES
        ))
    }

    pub fn movies_by_director(director: &str) -> Self {
        Self::new("SELECT * FROM movie WHERE director = $director;".to_string())
            .bind("director", director)
    }

    /// Point lookup of a single movie.
    pub fn movie_by_id(movie: &NodeRef) -> Self {
        debug_assert_eq!(movie.table(), Table::Movie);
        Self::new(format!("SELECT * FROM {};", movie))
    }

    /// The catalog, newest first. Unless `all` is set, only featured movies
    /// (or movies with no `featured` flag) are listed.
    pub fn list_movies(all: bool) -> Self {
        if all {
            Self::new("SELECT * FROM movie ORDER BY year DESC;".to_string())
        } else {
            Self::new(
                "SELECT * FROM movie WHERE featured = true OR featured IS NONE ORDER BY year DESC;"
                    .to_string(),
            )
        }
    }

    pub fn movie_genres(movie: &NodeRef) -> Self {
        debug_assert_eq!(movie.table(), Table::Movie);
        Self::new(format!(
            "SELECT {} AS {} FROM {};",
            MOVIE_GENRES, GENRES_FIELD, movie
        ))
    }

    /// Rated movies alongside the score and timestamp of each rating edge.
    /// The three projected arrays line up by index.
    pub fn user_ratings(user: &NodeRef) -> Self {
        debug_assert_eq!(user.table(), Table::User);
        Self::new(format!(
            "SELECT {} AS movie, ->rated.score AS score, ->rated.created_at AS created_at FROM {} FETCH movie;",
            RATED_MOVIES, user
        ))
    }

    /// Movies rated by users who also rated `movie`.
    pub fn co_rated_movies(movie: &NodeRef) -> Self {
        debug_assert_eq!(movie.table(), Table::Movie);
        Self::new(format!(
            "SELECT {} AS {field} FROM {} FETCH {field};",
            CO_RATED_MOVIES,
            movie,
            field = MOVIES_FIELD
        ))
    }

    /// Every user vertex, for the graph snapshot.
    pub fn graph_users() -> Self {
        Self::new("SELECT id, name, email FROM user;".to_string())
    }

    pub fn graph_movies() -> Self {
        Self::new("SELECT id, title, year, director FROM movie;".to_string())
    }

    /// Every rating edge with its endpoints.
    pub fn graph_ratings() -> Self {
        Self::new("SELECT id, in, out, score FROM rated;".to_string())
    }
}
