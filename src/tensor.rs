//! Dense row-major `f32` tensors handed to the training code.

/// A dense tensor with a fixed shape. Data is row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl Tensor {
    /// Zero-filled tensor of the given shape.
    pub fn zeros(shape: &[usize]) -> Self {
        let len = shape.iter().product();
        Self {
            shape: shape.to_vec(),
            data: vec![0.0; len],
        }
    }

    /// Tensor of the given shape with every element set to `value`.
    pub fn full(shape: &[usize], value: f32) -> Self {
        let len = shape.iter().product();
        Self {
            shape: shape.to_vec(),
            data: vec![value; len],
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn offset(&self, index: &[usize]) -> usize {
        assert_eq!(index.len(), self.shape.len(), "tensor rank mismatch");
        index
            .iter()
            .zip(&self.shape)
            .fold(0, |acc, (&i, &dim)| {
                assert!(i < dim, "index {} out of bounds for dimension {}", i, dim);
                acc * dim + i
            })
    }

    pub fn get(&self, index: &[usize]) -> f32 {
        self.data[self.offset(index)]
    }

    pub fn set(&mut self, index: &[usize], value: f32) {
        let offset = self.offset(index);
        self.data[offset] = value;
    }

    /// Number of elements in one entry along the first axis.
    fn stride0(&self) -> usize {
        self.shape[1..].iter().product()
    }

    /// Contiguous data of entry `i` along the first axis.
    pub fn entry(&self, i: usize) -> &[f32] {
        let stride = self.stride0();
        &self.data[i * stride..(i + 1) * stride]
    }

    /// Row `row` of the matrix at `sample` in a rank-3 tensor.
    pub fn row(&self, sample: usize, row: usize) -> &[f32] {
        let cols = self.shape[2];
        let start = self.offset(&[sample, row, 0]);
        &self.data[start..start + cols]
    }

    pub fn row_mut(&mut self, sample: usize, row: usize) -> &mut [f32] {
        let cols = self.shape[2];
        let start = self.offset(&[sample, row, 0]);
        &mut self.data[start..start + cols]
    }

    /// Gather entries along the first axis, in the given order.
    pub fn select(&self, indices: &[usize]) -> Tensor {
        let mut shape = self.shape.clone();
        shape[0] = indices.len();
        let data = indices.iter().flat_map(|&i| self.entry(i).iter().copied()).collect();
        Tensor { shape, data }
    }
}
