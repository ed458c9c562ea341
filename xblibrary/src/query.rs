//! Filtre de scènes partagé par toutes les implémentations de bibliothèque
//!
//! Le format JSON est celui des listes enregistrées (`search_params`) :
//! clés en camelCase, champs absents ou `null` ignorés.
//!
//! Dans `sites`, `tags` et `cast`, une valeur nue est une alternative
//! (au moins une doit correspondre), `&x` est obligatoire et `!x` exclut.
//! `sites` ne connaît que les formes nue et `!`.

use crate::model::Scene;
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SceneQuery {
    /// `"hidden"` sélectionne les scènes masquées, toute autre valeur les écarte
    pub dl_state: Option<String>,
    pub is_available: Option<bool>,
    pub is_accessible: Option<bool>,
    pub is_watched: Option<bool>,
    /// `watchlist`, `favourite`, `scripted` ; cumulatifs
    #[serde(deserialize_with = "nullable_list")]
    pub lists: Vec<String>,
    #[serde(deserialize_with = "nullable_list")]
    pub sites: Vec<String>,
    #[serde(deserialize_with = "nullable_list")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "nullable_list")]
    pub cast: Vec<String>,
    /// Préfixe de la date de sortie `YYYY-MM-DD`
    pub release_month: Option<String>,
    pub sort: Option<String>,
}

fn nullable_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items: Option<Vec<Option<String>>> = Option::deserialize(deserializer)?;
    Ok(items.unwrap_or_default().into_iter().flatten().collect())
}

/// Valeur de filtre décodée
enum Term<'a> {
    Any(&'a str),
    Must(&'a str),
    Not(&'a str),
}

fn parse_terms(values: &[String], allow_must: bool) -> Vec<Term<'_>> {
    values
        .iter()
        .filter(|v| !v.is_empty())
        .map(|v| {
            if let Some(rest) = v.strip_prefix('!') {
                Term::Not(rest)
            } else if let Some(rest) = v.strip_prefix('&').filter(|_| allow_must) {
                Term::Must(rest)
            } else {
                Term::Any(v.as_str())
            }
        })
        .collect()
}

fn match_terms(terms: &[Term<'_>], present: impl Fn(&str) -> bool) -> bool {
    let mut has_any = false;
    let mut any_matched = false;
    for term in terms {
        match term {
            Term::Any(v) => {
                has_any = true;
                any_matched |= present(*v);
            }
            Term::Must(v) if !present(*v) => return false,
            Term::Not(v) if present(*v) => return false,
            _ => {}
        }
    }
    !has_any || any_matched
}

impl SceneQuery {
    /// Scènes accessibles et non masquées
    pub fn accessible() -> Self {
        Self {
            is_accessible: Some(true),
            ..Default::default()
        }
    }

    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.sites.push(site.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_cast(mut self, actor: impl Into<String>) -> Self {
        self.cast.push(actor.into());
        self
    }

    pub fn with_release_month(mut self, month: impl Into<String>) -> Self {
        self.release_month = Some(month.into());
        self
    }

    /// Force accessibilité et disponibilité, quel que soit le filtre d'origine
    pub fn force_playable(mut self) -> Self {
        self.is_accessible = Some(true);
        self.is_available = Some(true);
        self
    }

    fn sort_key(&self) -> &str {
        self.sort.as_deref().unwrap_or("release_desc")
    }

    pub fn matches(&self, scene: &Scene) -> bool {
        let want_hidden = self.dl_state.as_deref() == Some("hidden");
        if scene.is_hidden != want_hidden {
            return false;
        }
        if self.is_available.is_some_and(|v| scene.is_available != v) {
            return false;
        }
        if self.is_accessible.is_some_and(|v| scene.is_accessible != v) {
            return false;
        }
        if self.is_watched.is_some_and(|v| scene.is_watched != v) {
            return false;
        }

        for list in &self.lists {
            let ok = match list.as_str() {
                "watchlist" => scene.watchlist,
                "favourite" => scene.favourite,
                "scripted" => scene.is_scripted,
                _ => true,
            };
            if !ok {
                return false;
            }
        }

        if !match_terms(&parse_terms(&self.sites, false), |s| scene.site == s) {
            return false;
        }
        if !match_terms(&parse_terms(&self.tags, true), |t| {
            scene.tags.iter().any(|x| x == t)
        }) {
            return false;
        }
        if !match_terms(&parse_terms(&self.cast, true), |c| {
            scene.cast.iter().any(|x| x == c)
        }) {
            return false;
        }

        if let Some(month) = &self.release_month {
            if !scene.release_text().starts_with(month.as_str()) {
                return false;
            }
        }

        match self.sort_key() {
            "rating_desc" | "rating_asc" => scene.star_rating > 0.0,
            "last_opened_desc" | "last_opened_asc" => scene.last_opened.is_some(),
            _ => true,
        }
    }

    /// Trie selon `sort` (défaut `release_desc`). Tri stable, clé primaire en second.
    /// `random` revient à l'ordre des clés primaires.
    pub fn sort_scenes(&self, scenes: &mut [Scene]) {
        fn by<T: PartialOrd>(a: T, b: T) -> Ordering {
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }

        let key = self.sort_key();
        scenes.sort_by(|a, b| {
            let primary = match key {
                "release_asc" => by(a.release_date, b.release_date),
                "added_desc" => by(b.added_date, a.added_date),
                "added_asc" => by(a.added_date, b.added_date),
                "total_file_size_desc" => by(b.total_file_size, a.total_file_size),
                "total_file_size_asc" => by(a.total_file_size, b.total_file_size),
                "total_watch_time_desc" => by(b.total_watch_time, a.total_watch_time),
                "total_watch_time_asc" => by(a.total_watch_time, b.total_watch_time),
                "rating_desc" => by(b.star_rating, a.star_rating),
                "rating_asc" => by(a.star_rating, b.star_rating),
                "last_opened_desc" => by(b.last_opened, a.last_opened),
                "last_opened_asc" => by(a.last_opened, b.last_opened),
                "scene_added_desc" => by(b.created_at, a.created_at),
                "scene_updated_desc" => by(b.updated_at, a.updated_at),
                "random" => Ordering::Equal,
                _ => by(b.release_date, a.release_date),
            };
            primary.then(a.id.cmp(&b.id))
        });
    }

    /// Filtre puis trie
    pub fn apply<'a>(&self, scenes: impl IntoIterator<Item = &'a Scene>) -> Vec<Scene> {
        let mut out: Vec<Scene> = scenes
            .into_iter()
            .filter(|s| self.matches(s))
            .cloned()
            .collect();
        self.sort_scenes(&mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn scene(id: u64, site: &str, tags: &[&str], cast: &[&str]) -> Scene {
        Scene {
            id,
            scene_id: format!("s-{}", id),
            site: site.to_string(),
            tags: tags.iter().map(|s| s.to_string()).collect(),
            cast: cast.iter().map(|s| s.to_string()).collect(),
            is_accessible: true,
            is_available: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_tag_terms() {
        let a = scene(1, "X", &["pov", "outdoor"], &[]);
        let b = scene(2, "X", &["pov"], &[]);
        let c = scene(3, "X", &["indoor"], &[]);

        let any = SceneQuery::accessible().with_tag("outdoor").with_tag("indoor");
        assert!(any.matches(&a) && !any.matches(&b) && any.matches(&c));

        let must = SceneQuery::accessible().with_tag("&pov").with_tag("&outdoor");
        assert!(must.matches(&a) && !must.matches(&b));

        let not = SceneQuery::accessible().with_tag("!outdoor");
        assert!(!not.matches(&a) && not.matches(&b) && not.matches(&c));
    }

    #[test]
    fn test_site_exclusion_and_ampersand() {
        let a = scene(1, "&Co", &[], &[]);
        let b = scene(2, "Other", &[], &[]);
        // `&` n'a pas de sens particulier pour les sites
        let q = SceneQuery::accessible().with_site("&Co");
        assert!(q.matches(&a) && !q.matches(&b));

        let q = SceneQuery::accessible().with_site("!Other");
        assert!(q.matches(&a) && !q.matches(&b));
    }

    #[test]
    fn test_visibility_flags() {
        let mut hidden = scene(1, "X", &[], &[]);
        hidden.is_hidden = true;
        let mut locked = scene(2, "X", &[], &[]);
        locked.is_accessible = false;

        assert!(!SceneQuery::accessible().matches(&hidden));
        assert!(!SceneQuery::accessible().matches(&locked));
        assert!(SceneQuery::default().matches(&locked));

        let q = SceneQuery {
            dl_state: Some("hidden".to_string()),
            ..Default::default()
        };
        assert!(q.matches(&hidden));
    }

    #[test]
    fn test_release_month_prefix() {
        let mut s = scene(1, "X", &[], &[]);
        s.release_date = NaiveDate::from_ymd_opt(2022, 11, 5);
        assert!(SceneQuery::accessible().with_release_month("2022-11").matches(&s));
        assert!(!SceneQuery::accessible().with_release_month("2022-10").matches(&s));
        assert!(SceneQuery::accessible().with_release_month("").matches(&s));
    }

    #[test]
    fn test_default_sort_is_release_desc() {
        let mut old = scene(1, "X", &[], &[]);
        old.release_date = NaiveDate::from_ymd_opt(2019, 1, 1);
        let mut new = scene(2, "X", &[], &[]);
        new.release_date = NaiveDate::from_ymd_opt(2023, 1, 1);

        let out = SceneQuery::accessible().apply([&old, &new]);
        assert_eq!(out[0].id, 2);
        assert_eq!(out[1].id, 1);
    }

    #[test]
    fn test_nullable_lists() {
        let q: SceneQuery =
            serde_json::from_str(r#"{"tags":null,"cast":["a",null],"releaseMonth":"2020"}"#)
                .unwrap();
        assert!(q.tags.is_empty());
        assert_eq!(q.cast, vec!["a"]);
        assert_eq!(q.release_month.as_deref(), Some("2020"));
    }

    #[test]
    fn test_rating_sort_filters_unrated() {
        let mut rated = scene(1, "X", &[], &[]);
        rated.star_rating = 4.0;
        let unrated = scene(2, "X", &[], &[]);
        let q = SceneQuery {
            sort: Some("rating_desc".to_string()),
            ..SceneQuery::accessible()
        };
        assert_eq!(q.apply([&rated, &unrated]).len(), 1);
    }
}
