//! Starter catalog for the in-memory backend.
//!
//! Book aggregates are preset figures. They hold until a review write touches the book, at
//! which point the aggregate is rebuilt from the stored reviews like any other book.
use catalog::{Book, Review, Timestamp, User};
use chrono::Duration;

const COVER_MOCKINGBIRD: &str = "https://images.unsplash.com/photo-1544947950-fa07a98d237f?ixlib=rb-4.0.3&auto=format&fit=crop&w=400&h=533";
const COVER_PORTRAIT: &str = "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?ixlib=rb-4.0.3&auto=format&fit=crop&w=400&h=533";
const COVER_LIBRARY: &str = "https://images.unsplash.com/photo-1481627834876-b7833e8f5570?ixlib=rb-4.0.3&auto=format&fit=crop&w=400&h=533";
const COVER_SHELF: &str = "https://images.unsplash.com/photo-1512820790803-83ca734da794?ixlib=rb-4.0.3&auto=format&fit=crop&w=400&h=533";

pub struct Sample {
    pub users: Vec<User>,
    pub books: Vec<Book>,
    pub reviews: Vec<Review>,
}

pub fn sample(now: Timestamp) -> Sample {
    Sample {
        users: users(now),
        books: books(now),
        reviews: reviews(now),
    }
}

fn user(id: u32, username: &str, email: &str, name: &str, bio: &str, now: Timestamp) -> User {
    User {
        id,
        username: username.to_string(),
        email: email.to_string(),
        name: name.to_string(),
        bio: Some(bio.to_string()),
        avatar: None,
        created_at: now,
    }
}

fn users(now: Timestamp) -> Vec<User> {
    vec![
        user(
            1,
            "john_reader",
            "john@example.com",
            "John Reader",
            "Passionate about fiction and sci-fi",
            now,
        ),
        user(
            2,
            "sarah_chen",
            "sarah@example.com",
            "Sarah Chen",
            "Love contemporary literature",
            now,
        ),
        user(
            3,
            "michael_rodriguez",
            "michael@example.com",
            "Michael Rodriguez",
            "Science fiction enthusiast",
            now,
        ),
    ]
}

struct Listing {
    title: &'static str,
    author: &'static str,
    description: &'static str,
    genre: &'static str,
    publish_date: &'static str,
    pages: u32,
    isbn: &'static str,
    cover_url: &'static str,
    average_rating: f64,
    total_reviews: u32,
}

const LISTINGS: [Listing; 6] = [
    Listing {
        title: "To Kill a Mockingbird",
        author: "Harper Lee",
        description: "A gripping, heart-wrenching, and wholly remarkable tale of coming-of-age in a South poisoned by virulent prejudice.",
        genre: "Fiction",
        publish_date: "1960",
        pages: 376,
        isbn: "9780061120084",
        cover_url: COVER_MOCKINGBIRD,
        average_rating: 4.8,
        total_reviews: 2341,
    },
    Listing {
        title: "The Martian",
        author: "Andy Weir",
        description: "Six days ago, astronaut Mark Watney became one of the first people to walk on Mars. Now, he's sure he'll be the first person to die there.",
        genre: "Science Fiction",
        publish_date: "2011",
        pages: 369,
        isbn: "9780553418026",
        cover_url: COVER_PORTRAIT,
        average_rating: 4.6,
        total_reviews: 1892,
    },
    Listing {
        title: "The Name of the Wind",
        author: "Patrick Rothfuss",
        description: "The riveting first-person narrative of a young man who grows to be the most notorious magician his world has ever seen.",
        genre: "Fantasy",
        publish_date: "2007",
        pages: 662,
        isbn: "9780756404079",
        cover_url: COVER_LIBRARY,
        average_rating: 4.7,
        total_reviews: 3156,
    },
    Listing {
        title: "Where the Crawdads Sing",
        author: "Delia Owens",
        description: "A coming-of-age story that will break your heart and put it back together again.",
        genre: "Contemporary Fiction",
        publish_date: "2018",
        pages: 384,
        isbn: "9780735219090",
        cover_url: COVER_SHELF,
        average_rating: 4.5,
        total_reviews: 4203,
    },
    Listing {
        title: "The Seven Husbands of Evelyn Hugo",
        author: "Taylor Jenkins Reid",
        description: "Aging and reclusive Hollywood movie icon Evelyn Hugo is finally ready to tell the truth about her glamorous and scandalous life.",
        genre: "Historical Fiction",
        publish_date: "2017",
        pages: 400,
        isbn: "9781501161933",
        cover_url: COVER_PORTRAIT,
        average_rating: 4.9,
        total_reviews: 5678,
    },
    Listing {
        title: "Project Hail Mary",
        author: "Andy Weir",
        description: "A lone astronaut must save the earth from disaster in this incredible new science-based thriller.",
        genre: "Science Fiction",
        publish_date: "2021",
        pages: 496,
        isbn: "9780593135204",
        cover_url: COVER_LIBRARY,
        average_rating: 4.8,
        total_reviews: 2987,
    },
];

fn books(now: Timestamp) -> Vec<Book> {
    LISTINGS
        .iter()
        .zip(1..)
        .map(|(listing, id)| Book {
            id,
            title: listing.title.to_string(),
            author: listing.author.to_string(),
            description: listing.description.to_string(),
            genre: listing.genre.to_string(),
            publish_date: listing.publish_date.to_string(),
            pages: listing.pages,
            isbn: Some(listing.isbn.to_string()),
            cover_url: Some(listing.cover_url.to_string()),
            average_rating: listing.average_rating,
            total_reviews: listing.total_reviews,
            created_at: now,
        })
        .collect()
}

fn reviews(now: Timestamp) -> Vec<Review> {
    vec![
        Review {
            id: 1,
            book_id: 5,
            user_id: 2,
            rating: 5,
            content: "This book absolutely captivated me from start to finish. Taylor Jenkins Reid has crafted a masterpiece that explores love, ambition, and the price of fame. Evelyn Hugo is a complex and fascinating character.".to_string(),
            likes: 24,
            created_at: now - Duration::hours(2),
        },
        Review {
            id: 2,
            book_id: 6,
            user_id: 3,
            rating: 4,
            content: "Andy Weir does it again! This sci-fi thriller had me on the edge of my seat. The scientific accuracy combined with humor makes it incredibly engaging. A must-read for science fiction fans.".to_string(),
            likes: 18,
            created_at: now - Duration::hours(5),
        },
        Review {
            id: 3,
            book_id: 1,
            user_id: 1,
            rating: 5,
            content: "A timeless classic that remains as relevant today as when it was first published. Harper Lee's storytelling is masterful, and the themes of justice and morality are powerfully presented.".to_string(),
            likes: 42,
            created_at: now - Duration::hours(12),
        },
    ]
}
