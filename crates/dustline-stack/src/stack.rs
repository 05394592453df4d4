//! Owned stacks of per-star probability surfaces.

use ndarray::Array2;

use crate::Rect2D;

/// Ordered collection of per-star probability surfaces over a shared grid.
///
/// Surface `i` at bin `(j, k)` holds an un-normalized density proportional
/// to `p_i(x_j, y_k)` with axis 0 spanning distance-modulus bins and axis 1
/// spanning reddening bins. The stack exclusively owns its surfaces and the
/// grid descriptor. Surfaces start zero-sized; loaders install populated
/// arrays with [`ImgStack::set_image`], and the sampler relies on the loader
/// to match every surface's shape to the rect.
#[derive(Debug, Clone, Default)]
pub struct ImgStack {
    images: Vec<Array2<f64>>,
    rect: Option<Rect2D>,
}

impl ImgStack {
    /// Allocates a stack of `n` empty surfaces with no grid descriptor.
    pub fn new(n: usize) -> Self {
        Self {
            images: (0..n).map(|_| Array2::zeros((0, 0))).collect(),
            rect: None,
        }
    }

    /// Allocates a stack of `n` empty surface slots owning a copy of `rect`.
    pub fn new_with_rect(n: usize, rect: Rect2D) -> Self {
        Self {
            images: (0..n).map(|_| Array2::zeros((0, 0))).collect(),
            rect: Some(rect),
        }
    }

    /// Assigns or overwrites the stored grid descriptor.
    pub fn set_rect(&mut self, rect: Rect2D) {
        self.rect = Some(rect);
    }

    /// Returns the shared grid descriptor, if one has been assigned.
    pub fn rect(&self) -> Option<&Rect2D> {
        self.rect.as_ref()
    }

    /// Number of surfaces currently held.
    pub fn n_images(&self) -> usize {
        self.images.len()
    }

    /// Borrow of all surfaces in stack order.
    pub fn images(&self) -> &[Array2<f64>] {
        &self.images
    }

    /// Borrow of surface `index`.
    pub fn image(&self, index: usize) -> &Array2<f64> {
        &self.images[index]
    }

    /// Installs a populated surface at `index`, replacing the previous one.
    pub fn set_image(&mut self, index: usize, image: Array2<f64>) {
        self.images[index] = image;
    }

    /// Drops all surfaces and the rect, then allocates `n` empty surfaces.
    pub fn resize(&mut self, n: usize) {
        self.images = (0..n).map(|_| Array2::zeros((0, 0))).collect();
        self.rect = None;
    }

    /// Compactly removes surfaces whose mask entry is `false`.
    ///
    /// Retained surfaces keep their relative order. The mask length must
    /// match the current image count; a mismatch is a programmer error.
    pub fn cull(&mut self, keep: &[bool]) {
        assert_eq!(
            keep.len(),
            self.images.len(),
            "cull mask length must match image count"
        );
        let mut index = 0;
        self.images.retain(|_| {
            let retained = keep[index];
            index += 1;
            retained
        });
    }
}
