//! Image resources and asynchronous load slots.
//!
//! Hosts load images in the background. A load hands back a `Pending` slot
//! whose `Resolver` the host completes later with either the loaded image
//! or a `LoadError`. Until a slot settles the renderer draws the placeholder.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;

/// Image drawn when a reference cannot be resolved.
pub const PLACEHOLDER_IMAGE: &str = "wko.png";

/// Images every game can reference without shipping them.
pub const DEFAULT_IMAGES: [&str; 6] = [
    "ground.png",
    "wko.png",
    "speech.png",
    "speech2.png",
    "speech3.png",
    "speech4.png",
];

pub const VALID_IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];
pub const VALID_SOUND_EXTENSIONS: [&str; 3] = ["mp3", "ogg", "wav"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("failed to load {url}: {reason}")]
    Failed { url: String, reason: String },
}

type Slot<T> = Rc<RefCell<Option<Result<T, LoadError>>>>;

/// The reading end of a load.
#[derive(Debug)]
pub struct Pending<T> {
    slot: Slot<T>,
}

impl<T> Clone for Pending<T> {
    fn clone(&self) -> Self {
        Pending {
            slot: Rc::clone(&self.slot),
        }
    }
}

/// The completing end of a load, handed to the host's loader.
#[derive(Debug)]
pub struct Resolver<T> {
    slot: Slot<T>,
}

pub fn pending<T>() -> (Resolver<T>, Pending<T>) {
    let slot = Rc::new(RefCell::new(None));
    (
        Resolver {
            slot: Rc::clone(&slot),
        },
        Pending { slot },
    )
}

impl<T> Resolver<T> {
    pub fn resolve(self, value: T) {
        *self.slot.borrow_mut() = Some(Ok(value));
    }

    pub fn reject(self, error: LoadError) {
        *self.slot.borrow_mut() = Some(Err(error));
    }
}

impl<T: Clone> Pending<T> {
    /// A slot that is already settled with `value`.
    pub fn ready(value: T) -> Self {
        let (resolver, pending) = pending();
        resolver.resolve(value);
        pending
    }

    pub fn failed(error: LoadError) -> Self {
        let (resolver, pending) = pending();
        resolver.reject(error);
        pending
    }

    /// `None` while the load is still in flight.
    pub fn peek(&self) -> Option<Result<T, LoadError>> {
        self.slot.borrow().clone()
    }
}

/// Natural size of a loaded image, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageInfo {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone)]
enum ImageSlot {
    Loading(Pending<ImageInfo>),
    Ready(ImageInfo),
    Failed,
}

/// What the renderer should blit for a requested path.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedImage {
    /// Key the host uses to find its texture.
    pub key: String,
    pub info: ImageInfo,
}

/// Image table keyed by every path a program may use to refer to an image.
#[derive(Debug, Clone, Default)]
pub struct ImageTable {
    slots: HashMap<String, ImageSlot>,
}

impl ImageTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str, load: Pending<ImageInfo>) {
        self.slots.insert(path.to_string(), ImageSlot::Loading(load));
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Fold settled loads into their final state. Failed loads are
    /// remembered so they keep drawing the placeholder.
    pub fn settle(&mut self) {
        for (path, slot) in self.slots.iter_mut() {
            let ImageSlot::Loading(load) = slot else {
                continue;
            };
            match load.peek() {
                Some(Ok(info)) => *slot = ImageSlot::Ready(info),
                Some(Err(e)) => {
                    log::warn!("image {path} falls back to {PLACEHOLDER_IMAGE}: {e}");
                    *slot = ImageSlot::Failed;
                }
                None => {}
            }
        }
    }

    /// Look up a loaded image. Leading `./` is ignored. Loads that are still
    /// in flight or have failed resolve to nothing.
    pub fn get(&self, path: &str) -> Option<ResolvedImage> {
        let path = remove_if_starts_with(path, "./");
        let info = match self.slots.get(path)? {
            ImageSlot::Ready(info) => *info,
            ImageSlot::Loading(load) => load.peek()?.ok()?,
            ImageSlot::Failed => return None,
        };
        Some(ResolvedImage {
            key: path.to_string(),
            info,
        })
    }

    /// The placeholder image, sized like a cell when it is not loaded either.
    pub fn placeholder(&self, cell_size: f64) -> ResolvedImage {
        self.get(PLACEHOLDER_IMAGE).unwrap_or(ResolvedImage {
            key: PLACEHOLDER_IMAGE.to_string(),
            info: ImageInfo {
                width: cell_size,
                height: cell_size,
            },
        })
    }
}

pub fn remove_if_starts_with<'a>(path: &'a str, prefix: &str) -> &'a str {
    path.strip_prefix(prefix).unwrap_or(path)
}
