/// Square crop rectangle in source-frame pixels, half-open on the
/// bottom/right edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropWindow {
    pub top: i32,
    pub left: i32,
    pub bottom: i32,
    pub right: i32,
}

impl CropWindow {
    pub fn new(top: i32, left: i32, bottom: i32, right: i32) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    /// Side length. Equal to the height for every window built by
    /// [`FrameLocator`](super::frame_locator::FrameLocator).
    pub fn side(&self) -> i32 {
        self.right - self.left
    }

    pub fn is_square(&self) -> bool {
        self.right - self.left == self.bottom - self.top
    }

    /// True when the window is non-empty and lies inside a
    /// `width` x `height` frame.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        0 <= self.left
            && self.left < self.right
            && self.right <= width as i32
            && 0 <= self.top
            && self.top < self.bottom
            && self.bottom <= height as i32
    }
}
