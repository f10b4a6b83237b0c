use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::{graph::NodeRef, models::Movie};

/// Kind of interest a candidate was matched on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Genre,
    Director,
}

/// A movie under consideration together with the signals supporting it
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub movie: Movie,
    pub weight: u32,
    pub genre_matches: u32,
    pub director_matches: u32,
}

/// Movies matched by a single genre or director
///
/// Built by one signal task and handed to the coordinator; a movie counts at
/// most once per signal even if the store lists it twice.
#[derive(Debug)]
pub struct SignalContribution {
    signal: Signal,
    movies: BTreeMap<NodeRef, Movie>,
}

impl SignalContribution {
    pub fn new(signal: Signal) -> Self {
        Self {
            signal,
            movies: BTreeMap::new(),
        }
    }

    pub fn contains(&self, id: &NodeRef) -> bool {
        self.movies.contains_key(id)
    }

    /// Adds a movie; returns false if it was already matched by this signal.
    pub fn add(&mut self, movie: Movie) -> bool {
        if self.movies.contains_key(&movie.id) {
            return false;
        }
        self.movies.insert(movie.id.clone(), movie);
        true
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }
}

/// Weight map shared by all signals of one recommendation
///
/// Only the coordinating task merges into it. Movies in the excluded set are
/// never admitted.
#[derive(Debug)]
pub struct CandidateAccumulator {
    excluded: Arc<HashSet<NodeRef>>,
    candidates: HashMap<NodeRef, Candidate>,
}

impl CandidateAccumulator {
    pub fn new(excluded: Arc<HashSet<NodeRef>>) -> Self {
        Self {
            excluded,
            candidates: HashMap::new(),
        }
    }

    /// Adds one signal's matches, +1 weight per movie. The first payload seen
    /// for a movie is kept.
    pub fn merge(&mut self, contribution: SignalContribution) {
        let signal = contribution.signal;
        for (id, movie) in contribution.movies {
            if self.excluded.contains(&id) {
                continue;
            }
            let candidate = self.candidates.entry(id).or_insert_with(|| Candidate {
                movie,
                weight: 0,
                genre_matches: 0,
                director_matches: 0,
            });
            candidate.weight += 1;
            match signal {
                Signal::Genre => candidate.genre_matches += 1,
                Signal::Director => candidate.director_matches += 1,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Candidates by descending weight, ties broken by ascending reference,
    /// cut to `limit`.
    pub fn ranked(self, limit: usize) -> Vec<Candidate> {
        let mut ranked: Vec<Candidate> = self.candidates.into_values().collect();
        ranked.sort_by(|a, b| {
            b.weight
                .cmp(&a.weight)
                .then_with(|| a.movie.id.cmp(&b.movie.id))
        });
        ranked.truncate(limit);
        ranked
    }
}
