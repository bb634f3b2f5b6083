//! Literal book-domain records: authors, publishers, books and reviews.

use colored::Colorize;
use sandbox_seed_store::{Record, VectorStore};
use serde_json::json;

use crate::batch::{insert_batch, BatchReport};
use crate::catalog::{AUTHOR, BOOK, PUBLISHER, REVIEW};
use crate::link::{insert_linked_batch, LinkPolicy};

pub fn authors() -> Vec<Record> {
    vec![
        Record::from_json(
            "J.K. Rowling",
            json!({
                "name": "J.K. Rowling",
                "bio": "British author best known for the Harry Potter fantasy series",
                "birthYear": 1965,
                "isActive": true,
                "address": {"street": "123 Magic Lane", "city": "Edinburgh", "country": "Scotland", "zipCode": "EH1 1AA"},
                "coordinates": {"latitude": 55.9533, "longitude": -3.1883}
            }),
        ),
        Record::from_json(
            "George R.R. Martin",
            json!({
                "name": "George R.R. Martin",
                "bio": "American novelist and short story writer, known for A Song of Ice and Fire",
                "birthYear": 1948,
                "isActive": true,
                "address": {"street": "456 Winter Street", "city": "Santa Fe", "country": "USA", "zipCode": "87501"},
                "coordinates": {"latitude": 35.6870, "longitude": -105.9378}
            }),
        ),
        Record::from_json(
            "Agatha Christie",
            json!({
                "name": "Agatha Christie",
                "bio": "English writer known for her detective novels featuring Hercule Poirot",
                "birthYear": 1890,
                "isActive": false,
                "address": {"street": "789 Mystery Avenue", "city": "Torquay", "country": "England", "zipCode": "TQ1 1AA"},
                "coordinates": {"latitude": 50.4619, "longitude": -3.5253}
            }),
        ),
    ]
}

pub fn publishers() -> Vec<Record> {
    vec![
        Record::from_json(
            "Bloomsbury Publishing",
            json!({
                "name": "Bloomsbury Publishing",
                "foundedYear": 1986,
                "website": "https://www.bloomsbury.com",
                "contactInfo": {"email": "info@bloomsbury.com", "phone": "+44 20 7631 5600", "address": "50 Bedford Square, London WC1B 3DP"},
                "headquarters": {"latitude": 51.5194, "longitude": -0.1291}
            }),
        ),
        Record::from_json(
            "Bantam Books",
            json!({
                "name": "Bantam Books",
                "foundedYear": 1945,
                "website": "https://www.bantam.com",
                "contactInfo": {"email": "contact@bantam.com", "phone": "+1 212 782 9000", "address": "1745 Broadway, New York, NY 10019"},
                "headquarters": {"latitude": 40.7614, "longitude": -73.9776}
            }),
        ),
        Record::from_json(
            "HarperCollins",
            json!({
                "name": "HarperCollins",
                "foundedYear": 1989,
                "website": "https://www.harpercollins.com",
                "contactInfo": {"email": "info@harpercollins.com", "phone": "+1 212 207 7000", "address": "195 Broadway, New York, NY 10007"},
                "headquarters": {"latitude": 40.7128, "longitude": -74.0060}
            }),
        ),
    ]
}

/// Books without their references; those are attached at load time.
pub fn books() -> Vec<Record> {
    vec![
        Record::from_json(
            "Harry Potter and the Philosopher's Stone",
            json!({
                "title": "Harry Potter and the Philosopher's Stone",
                "description": "The first book in the Harry Potter series about a young wizard's adventures",
                "isbn": "978-0-7475-3269-9",
                "publishedDate": "1997-06-26T00:00:00Z",
                "pageCount": 223,
                "price": 12.99,
                "inStock": true,
                "genre": "Fantasy",
                "metadata": {"language": "English", "edition": "First Edition", "format": "Hardcover", "weight": 0.5}
            }),
        ),
        Record::from_json(
            "A Game of Thrones",
            json!({
                "title": "A Game of Thrones",
                "description": "The first novel in A Song of Ice and Fire series, epic fantasy set in Westeros",
                "isbn": "978-0-553-10354-0",
                "publishedDate": "1996-08-01T00:00:00Z",
                "pageCount": 694,
                "price": 15.99,
                "inStock": true,
                "genre": "Epic Fantasy",
                "metadata": {"language": "English", "edition": "Mass Market", "format": "Paperback", "weight": 0.8}
            }),
        ),
        Record::from_json(
            "Murder on the Orient Express",
            json!({
                "title": "Murder on the Orient Express",
                "description": "A classic detective novel featuring Hercule Poirot solving a murder on a train",
                "isbn": "978-0-00-711926-0",
                "publishedDate": "1934-01-01T00:00:00Z",
                "pageCount": 256,
                "price": 9.99,
                "inStock": false,
                "genre": "Mystery",
                "metadata": {"language": "English", "edition": "Reprint", "format": "Paperback", "weight": 0.3}
            }),
        ),
    ]
}

pub fn reviews() -> Vec<Record> {
    vec![
        Record::from_json(
            "Magical and Captivating",
            json!({
                "title": "Magical and Captivating",
                "content": "An absolutely wonderful introduction to the wizarding world. Rowling's imagination knows no bounds!",
                "rating": 5,
                "reviewDate": "2023-01-15T10:30:00Z",
                "verified": true,
                "reviewer": {"name": "BookLover123", "email": "booklover@example.com", "memberSince": "2020-03-01T00:00:00Z", "totalReviews": 47}
            }),
        ),
        Record::from_json(
            "Epic but Slow Start",
            json!({
                "title": "Epic but Slow Start",
                "content": "Game of Thrones is incredibly detailed and complex. Takes time to get into but worth the investment.",
                "rating": 4,
                "reviewDate": "2023-02-20T14:45:00Z",
                "verified": true,
                "reviewer": {"name": "FantasyFan", "email": "fantasy@example.com", "memberSince": "2019-07-15T00:00:00Z", "totalReviews": 23}
            }),
        ),
        Record::from_json(
            "Classic Mystery Done Right",
            json!({
                "title": "Classic Mystery Done Right",
                "content": "Christie's plotting is masterful. Every clue is perfectly placed and the solution is both surprising and logical.",
                "rating": 5,
                "reviewDate": "2023-03-10T09:15:00Z",
                "verified": false,
                "reviewer": {"name": "MysteryReader", "email": "mystery@example.com", "memberSince": "2021-11-20T00:00:00Z", "totalReviews": 12}
            }),
        ),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDomainReport {
    pub authors: BatchReport,
    pub publishers: BatchReport,
    pub books: BatchReport,
    pub reviews: BatchReport,
}

impl BookDomainReport {
    pub fn batches(&self) -> [&BatchReport; 4] {
        [&self.authors, &self.publishers, &self.books, &self.reviews]
    }

    pub fn failed(&self) -> usize {
        self.batches().iter().map(|b| b.failed()).sum()
    }
}

/// Insert the literal book domain. The collections must already exist.
///
/// Parents go in first so their ids can be linked into books, and books
/// before reviews.
pub fn load_book_domain<S>(store: &S, policy: LinkPolicy) -> BookDomainReport
where
    S: VectorStore + ?Sized,
{
    println!("\nPopulating book domain collections...");

    let authors = insert_batch(store, AUTHOR, &authors(), 0);
    let publishers = insert_batch(store, PUBLISHER, &publishers(), 0);

    let author_ids = authors.ids();
    let publisher_ids = publishers.ids();
    let books = insert_linked_batch(
        store,
        BOOK,
        &books(),
        &[("writtenBy", &author_ids), ("publishedBy", &publisher_ids)],
        policy,
    );

    let book_ids = books.ids();
    let reviews = insert_linked_batch(
        store,
        REVIEW,
        &reviews(),
        &[("reviewsBook", &book_ids)],
        policy,
    );

    let report = BookDomainReport {
        authors,
        publishers,
        books,
        reviews,
    };
    for batch in report.batches() {
        println!("  - {}", batch.summary());
    }
    if report.failed() == 0 {
        println!("{} Book domain collections populated successfully!", "✓".green());
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::definer::define_collections;
    use sandbox_seed_store::MemoryStore;

    #[test]
    fn every_literal_validates_against_its_collection() {
        for (def, records) in [
            (catalog::author(), authors()),
            (catalog::publisher(), publishers()),
            (catalog::book(), books()),
            (catalog::review(), reviews()),
        ] {
            for record in &records {
                def.validate(record)
                    .unwrap_or_else(|e| panic!("{} in {}: {e}", record.label, def.name));
            }
        }
    }

    #[test]
    fn loads_three_of_each() {
        let store = MemoryStore::new();
        assert!(define_collections(&store, &catalog::book_domain()).is_complete());

        let report = load_book_domain(&store, LinkPolicy::default());
        assert_eq!(report.failed(), 0);
        for name in [AUTHOR, PUBLISHER, BOOK, REVIEW] {
            assert_eq!(store.count(name).unwrap(), 3, "{name}");
        }
    }

    #[test]
    fn missing_authors_fail_every_book() {
        let store = MemoryStore::new();
        let defs = catalog::book_domain();
        define_collections(&store, &defs);
        // Author inserts fail once the collection is gone.
        store.delete_collection(AUTHOR).unwrap();

        let report = load_book_domain(&store, LinkPolicy::FallbackToFirst);
        assert_eq!(report.authors.failed(), 3);
        assert_eq!(report.books.failed(), 3);
        assert_eq!(report.reviews.failed(), 3);
        assert_eq!(report.publishers.succeeded(), 3);
    }
}
