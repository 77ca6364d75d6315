//! # Catalog Queries
//!
//! Filter, rank and slice books for the listing page, plus the home page picks and genre facets.
//!
//! ## Listing
//! 1. Search: case-insensitive substring of title, author or description
//! 2. Genre: exact match
//! 3. `total` is counted after filtering, before slicing
//! 4. Rank by **averageRating** descending, lower id first on ties
//! 5. Slice `(page - 1) * limit` onwards, `limit` books
use std::{cmp::Ordering, collections::BTreeMap};

use serde::{Deserialize, Serialize};

use crate::Book;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 12;
pub const MAX_LIMIT: u32 = 100;
pub const FEATURED_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookQuery {
    pub search: Option<String>,
    pub genre: Option<String>,
    pub page: u32,
    pub limit: u32,
}

impl Default for BookQuery {
    fn default() -> Self {
        Self {
            search: None,
            genre: None,
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl BookQuery {
    pub fn offset(&self) -> usize {
        (self.page.max(1) as usize - 1).saturating_mul(self.limit as usize)
    }

    fn matcher(&self) -> impl Fn(&Book) -> bool + '_ {
        let needle = self
            .search
            .as_deref()
            .filter(|search| !search.is_empty())
            .map(str::to_lowercase);
        let genre = self.genre.as_deref().filter(|genre| !genre.is_empty());

        move |book: &Book| {
            let searched = needle.as_deref().is_none_or(|needle| {
                book.title.to_lowercase().contains(needle)
                    || book.author.to_lowercase().contains(needle)
                    || book.description.to_lowercase().contains(needle)
            });

            searched && genre.is_none_or(|genre| book.genre == genre)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPage {
    pub books: Vec<Book>,
    pub total: usize,
    pub page: u32,
    pub limit: u32,
    pub total_pages: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreCount {
    pub name: String,
    pub count: usize,
}

/// Caps a requested page size at [`MAX_LIMIT`].
pub fn clamp_limit(limit: u32) -> u32 {
    limit.min(MAX_LIMIT)
}

fn by_rating(a: &Book, b: &Book) -> Ordering {
    b.average_rating
        .total_cmp(&a.average_rating)
        .then_with(|| a.id.cmp(&b.id))
}

pub fn list_books<'a, I>(books: I, query: &BookQuery) -> BookPage
where
    I: IntoIterator<Item = &'a Book>,
{
    let matches = query.matcher();
    let mut filtered: Vec<&Book> = books.into_iter().filter(|book| matches(*book)).collect();
    filtered.sort_by(|a, b| by_rating(a, b));

    let total = filtered.len();
    let limit = query.limit.max(1);

    BookPage {
        books: filtered
            .into_iter()
            .skip(query.offset())
            .take(limit as usize)
            .cloned()
            .collect(),
        total,
        page: query.page,
        limit,
        total_pages: total.div_ceil(limit as usize),
    }
}

/// Highest rated books for the home page.
pub fn featured_books<'a, I>(books: I) -> Vec<Book>
where
    I: IntoIterator<Item = &'a Book>,
{
    let mut ranked: Vec<&Book> = books.into_iter().collect();
    ranked.sort_by(|a, b| by_rating(a, b));

    ranked.into_iter().take(FEATURED_COUNT).cloned().collect()
}

/// Books per genre, most populated first, then alphabetical.
pub fn genre_counts<'a, I>(books: I) -> Vec<GenreCount>
where
    I: IntoIterator<Item = &'a Book>,
{
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for book in books {
        *counts.entry(book.genre.as_str()).or_default() += 1;
    }

    let mut genres: Vec<GenreCount> = counts
        .into_iter()
        .map(|(name, count)| GenreCount {
            name: name.to_string(),
            count,
        })
        .collect();
    // stable sort keeps the alphabetical order from the map within equal counts
    genres.sort_by(|a, b| b.count.cmp(&a.count));

    genres
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::NewBook;

    fn book(id: u32, title: &str, author: &str, genre: &str, rating: f64) -> Book {
        let mut book = NewBook {
            title: title.to_string(),
            author: author.to_string(),
            description: format!("A story by {author}."),
            genre: genre.to_string(),
            publish_date: "2020".to_string(),
            pages: 300,
            isbn: None,
            cover_url: None,
        }
        .into_book(id, Utc::now());
        book.average_rating = rating;
        book
    }

    fn shelf() -> Vec<Book> {
        vec![
            book(1, "To Kill a Mockingbird", "Harper Lee", "Fiction", 4.8),
            book(2, "The Martian", "Andy Weir", "Science Fiction", 4.6),
            book(3, "The Name of the Wind", "Patrick Rothfuss", "Fantasy", 4.7),
            book(4, "Where the Crawdads Sing", "Delia Owens", "Contemporary Fiction", 4.5),
            book(5, "Evelyn Hugo", "Taylor Jenkins Reid", "Historical Fiction", 4.9),
            book(6, "Project Hail Mary", "Andy Weir", "Science Fiction", 4.8),
        ]
    }

    fn ids(books: &[Book]) -> Vec<u32> {
        books.iter().map(|book| book.id).collect()
    }

    #[test]
    fn test_default_listing_is_ranked() {
        let page = list_books(&shelf(), &BookQuery::default());

        assert_eq!(ids(&page.books), vec![5, 1, 6, 3, 2, 4]);
        assert_eq!(page.total, 6);
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 12);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let query = BookQuery {
            search: Some("WEIR".to_string()),
            ..Default::default()
        };
        let page = list_books(&shelf(), &query);

        assert_eq!(ids(&page.books), vec![6, 2]);
        assert_eq!(page.total, 2);
    }

    #[test]
    fn test_search_covers_description() {
        let query = BookQuery {
            search: Some("story by delia".to_string()),
            ..Default::default()
        };

        assert_eq!(ids(&list_books(&shelf(), &query).books), vec![4]);
    }

    #[test]
    fn test_genre_is_exact() {
        let query = BookQuery {
            genre: Some("Fiction".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&list_books(&shelf(), &query).books), vec![1]);

        let query = BookQuery {
            genre: Some("fiction".to_string()),
            ..Default::default()
        };
        assert_eq!(list_books(&shelf(), &query).total, 0);
    }

    #[test]
    fn test_empty_filters_are_ignored() {
        let query = BookQuery {
            search: Some(String::new()),
            genre: Some(String::new()),
            ..Default::default()
        };

        assert_eq!(list_books(&shelf(), &query).total, 6);
    }

    #[test]
    fn test_pagination() {
        let query = BookQuery {
            page: 2,
            limit: 4,
            ..Default::default()
        };
        let page = list_books(&shelf(), &query);

        assert_eq!(ids(&page.books), vec![2, 4]);
        assert_eq!(page.total, 6);
        assert_eq!(page.total_pages, 2);
    }

    #[test]
    fn test_page_past_the_end() {
        let query = BookQuery {
            page: 9,
            limit: 4,
            ..Default::default()
        };
        let page = list_books(&shelf(), &query);

        assert!(page.books.is_empty());
        assert_eq!(page.total, 6);
        assert_eq!(page.page, 9);
    }

    #[test]
    fn test_no_matches() {
        let query = BookQuery {
            search: Some("nonexistent".to_string()),
            ..Default::default()
        };
        let page = list_books(&shelf(), &query);

        assert_eq!(page.total, 0);
        assert_eq!(page.total_pages, 0);
    }

    #[test]
    fn test_featured() {
        assert_eq!(ids(&featured_books(&shelf())), vec![5, 1, 6, 3]);
        assert!(featured_books(&Vec::new()).is_empty());
    }

    #[test]
    fn test_genre_counts() {
        let genres = genre_counts(&shelf());

        assert_eq!(
            genres[0],
            GenreCount {
                name: "Science Fiction".to_string(),
                count: 2
            }
        );
        let rest: Vec<&str> = genres[1..].iter().map(|genre| genre.name.as_str()).collect();
        assert_eq!(
            rest,
            vec![
                "Contemporary Fiction",
                "Fantasy",
                "Fiction",
                "Historical Fiction"
            ]
        );
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(12), 12);
        assert_eq!(clamp_limit(5000), MAX_LIMIT);
    }
}
