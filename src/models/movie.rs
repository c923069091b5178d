use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Release-era classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Era {
    Classic,
    Modern,
    Recent,
}

impl Era {
    /// Classifies a release year into an era
    pub fn from_year(year: i32) -> Self {
        match year {
            y if y < 1990 => Era::Classic,
            y if y < 2015 => Era::Modern,
            _ => Era::Recent,
        }
    }
}

/// Mood tags a movie can carry
///
/// `Short` is special: it is defined by runtime (<= 100 minutes) rather than
/// by tag membership. All other moods are catalog-supplied groupings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    FeelGood,
    Intense,
    Funny,
    Romantic,
    Scary,
    ThoughtProvoking,
    Short,
}

/// User feedback on a served movie
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SwipeAction {
    Like,
    Pass,
    Save,
}

/// Maximum runtime, in minutes, for a movie to count as `Mood::Short`
pub const SHORT_RUNTIME_MINUTES: u32 = 100;

/// A movie as supplied by the catalog provider
///
/// Movies are sourced externally and treated as read-only by the engine.
/// Optional classification fields (genres, moods, directors, cast) default
/// to empty; absence is never an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    /// Unique identifier for the movie
    pub id: Uuid,
    /// Display title
    pub title: String,
    /// Genre labels, first entry is the primary genre
    #[serde(default)]
    pub genres: Vec<String>,
    /// Mood tags from the closed mood set
    #[serde(default)]
    pub moods: Vec<Mood>,
    /// Release-era label
    pub era: Era,
    /// Runtime in minutes
    pub runtime_minutes: u32,
    /// Average rating on a 0-10 scale
    pub rating: f64,
    /// Number of ratings behind the average
    pub rating_count: u32,
    /// Popularity score; `None` is treated as a neutral default by the scorer
    #[serde(default)]
    pub popularity: Option<f64>,
    /// Year of release
    pub release_year: i32,
    /// Directors, first entry is the primary director
    #[serde(default)]
    pub directors: Vec<String>,
    /// Billed cast in order
    #[serde(default)]
    pub cast: Vec<String>,
}

impl Movie {
    /// Creates a movie with a fresh id and era derived from the release year
    pub fn new(title: impl Into<String>, release_year: i32, runtime_minutes: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            genres: Vec::new(),
            moods: Vec::new(),
            era: Era::from_year(release_year),
            runtime_minutes,
            rating: 0.0,
            rating_count: 0,
            popularity: None,
            release_year,
            directors: Vec::new(),
            cast: Vec::new(),
        }
    }

    pub fn with_genres(mut self, genres: &[&str]) -> Self {
        self.genres = genres.iter().map(|g| g.to_string()).collect();
        self
    }

    pub fn with_moods(mut self, moods: &[Mood]) -> Self {
        self.moods = moods.to_vec();
        self
    }

    pub fn with_rating(mut self, rating: f64, rating_count: u32) -> Self {
        self.rating = rating;
        self.rating_count = rating_count;
        self
    }

    pub fn with_popularity(mut self, popularity: f64) -> Self {
        self.popularity = Some(popularity);
        self
    }

    pub fn with_directors(mut self, directors: &[&str]) -> Self {
        self.directors = directors.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn with_cast(mut self, cast: &[&str]) -> Self {
        self.cast = cast.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Primary genre, used by the diversity constraint
    pub fn primary_genre(&self) -> Option<&str> {
        self.genres.first().map(String::as_str)
    }

    /// Primary director, used by the diversity constraint
    pub fn primary_director(&self) -> Option<&str> {
        self.directors.first().map(String::as_str)
    }

    /// Whether the movie matches a mood filter
    pub fn has_mood(&self, mood: Mood) -> bool {
        match mood {
            Mood::Short => self.runtime_minutes <= SHORT_RUNTIME_MINUTES,
            other => self.moods.contains(&other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_era_from_year() {
        assert_eq!(Era::from_year(1975), Era::Classic);
        assert_eq!(Era::from_year(2001), Era::Modern);
        assert_eq!(Era::from_year(2023), Era::Recent);
    }

    #[test]
    fn test_new_movie_defaults() {
        let movie = Movie::new("The Conversation", 1974, 113);
        assert_eq!(movie.title, "The Conversation");
        assert_eq!(movie.era, Era::Classic);
        assert!(movie.genres.is_empty());
        assert!(movie.popularity.is_none());
    }

    #[test]
    fn test_short_mood_is_runtime_based() {
        let short = Movie::new("Run Lola Run", 1998, 80);
        let long = Movie::new("Oppenheimer", 2023, 180);
        assert!(short.has_mood(Mood::Short));
        assert!(!long.has_mood(Mood::Short));
    }

    #[test]
    fn test_tagged_mood_membership() {
        let movie = Movie::new("Paddington 2", 2017, 103).with_moods(&[Mood::FeelGood, Mood::Funny]);
        assert!(movie.has_mood(Mood::FeelGood));
        assert!(!movie.has_mood(Mood::Scary));
    }

    #[test]
    fn test_swipe_action_serialization() {
        let json = serde_json::to_string(&SwipeAction::Like).unwrap();
        assert_eq!(json, "\"like\"");
        let json = serde_json::to_string(&Mood::FeelGood).unwrap();
        assert_eq!(json, "\"feel_good\"");
    }
}
