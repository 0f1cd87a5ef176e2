use crate::{
    db::book_store::BookStore,
    error::Result,
    models::{
        book::{Book, BookForm},
        notification::{NewNotification, crosses_threshold},
    },
    services::{
        notifier::Notifier,
        uploads::{ImageStore, UploadedImage},
    },
};

/// Admin-side catalog changes: validation, cover images and notifications
#[derive(Clone)]
pub struct CatalogService {
    books: BookStore,
    images: ImageStore,
    notifier: Notifier,
}

impl CatalogService {
    pub fn new(books: BookStore, images: ImageStore, notifier: Notifier) -> Self {
        Self {
            books,
            images,
            notifier,
        }
    }

    pub async fn create(&self, form: &BookForm, image: Option<UploadedImage>) -> Result<Book> {
        let input = form.validate()?;

        let image_filename = match &image {
            Some(image) => Some(self.images.save(image).await?),
            None => None,
        };

        let book = match self.books.create(&input, image_filename.as_deref()).await {
            Ok(book) => book,
            Err(e) => {
                if let Some(name) = &image_filename {
                    self.discard_image(name).await;
                }
                return Err(e);
            }
        };

        self.notifier
            .record(NewNotification::book_added(&book.title, &book.author))
            .await;
        Ok(book)
    }

    /// Update a book. A new image replaces the old file.
    pub async fn update(
        &self,
        id: i64,
        form: &BookForm,
        image: Option<UploadedImage>,
    ) -> Result<Book> {
        let input = form.validate()?;
        let existing = self.books.find(id).await?;

        let new_image = match &image {
            Some(image) => Some(self.images.save(image).await?),
            None => None,
        };
        let image_filename = new_image.as_deref().or(existing.image_filename.as_deref());

        let book = match self.books.update(id, &input, image_filename).await {
            Ok(book) => book,
            Err(e) => {
                if let Some(name) = &new_image {
                    self.discard_image(name).await;
                }
                return Err(e);
            }
        };

        if let Some(old) = replaced_image(existing.image_filename.as_deref(), new_image.as_deref()) {
            self.discard_image(old).await;
        }

        if crosses_threshold(existing.stock, book.stock, book.stock_threshold) {
            self.notifier
                .record(NewNotification::low_stock(&book.title, book.stock))
                .await;
        }

        tracing::info!(book_id = book.id, "Book updated");
        Ok(book)
    }

    /// Delete a book together with its cover image
    pub async fn delete(&self, id: i64) -> Result<Book> {
        let book = self.books.delete(id).await?;

        if let Some(name) = &book.image_filename {
            self.discard_image(name).await;
        }

        self.notifier
            .record(NewNotification::book_deleted(&book.title))
            .await;
        tracing::info!(book_id = book.id, title = %book.title, "Book deleted");
        Ok(book)
    }

    async fn discard_image(&self, name: &str) {
        if let Err(e) = self.images.remove(name).await {
            tracing::warn!(file = %name, error = %e, "Failed to remove cover image");
        }
    }
}

/// The stored file an update leaves behind. A new upload can land on the old
/// name when both happen within the same second; that file is still in use.
fn replaced_image<'a>(old: Option<&'a str>, new: Option<&str>) -> Option<&'a str> {
    match (old, new) {
        (Some(old), Some(new)) if old != new => Some(old),
        _ => None,
    }
}
