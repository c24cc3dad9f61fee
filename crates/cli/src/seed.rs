//! Sample data for demos and manual testing

use anyhow::Result;
use libman_business::{CatalogService, NewBook, NewPatron, PatronService};
use libman_persistence::Database;

pub async fn run(db: &Database) -> Result<()> {
    let catalog = CatalogService::new(db.clone());
    let patrons = PatronService::new(db.clone());

    let books = [
        ("Dune", "Frank Herbert", "Science Fiction", 3, Some(1965)),
        ("Foundation", "Isaac Asimov", "Science Fiction", 2, Some(1951)),
        ("The Pragmatic Programmer", "Andrew Hunt", "Software", 2, Some(1999)),
        ("Clean Code", "Robert Martin", "Software", 1, Some(2008)),
        ("A Brief History of Time", "Stephen Hawking", "Science", 2, Some(1988)),
    ];

    for (title, author, category, copies, year) in books {
        let book = catalog
            .create(NewBook {
                title: title.to_string(),
                author: author.to_string(),
                category: category.to_string(),
                total_copies: copies,
                published_year: year,
                ..Default::default()
            })
            .await?;
        println!("  book   {}  {}", book.id, book.title);
    }

    let members = [
        ("Alice Nguyen", "alice@example.edu", "student", Some("Physics")),
        ("Bob Tran", "bob@example.edu", "faculty", Some("Mathematics")),
        ("Carol Pham", "carol@example.edu", "staff", None),
        ("Dave Le", "dave@example.com", "public", None),
    ];

    for (name, email, patron_type, department) in members {
        let patron = patrons
            .create(NewPatron {
                name: name.to_string(),
                email: email.to_string(),
                patron_type: patron_type.to_string(),
                department: department.map(str::to_string),
            })
            .await?;
        println!("  patron {}  {}", patron.id, patron.name);
    }

    println!("Seed complete: {} books, {} patrons", books.len(), members.len());
    Ok(())
}
