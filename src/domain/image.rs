/// Pixel values for one image in channel-first layout `[C, H, W]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    pub shape:  [usize; 3],
    pub values: Vec<f32>,
}

impl ImageTensor {
    /// Returns `None` when `values` does not fill `shape` exactly.
    pub fn new(shape: [usize; 3], values: Vec<f32>) -> Option<Self> {
        (shape.iter().product::<usize>() == values.len()).then_some(Self { shape, values })
    }
}
