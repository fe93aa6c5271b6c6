//! # Linear Layer Modules
//!
//! [`MatMul`] computes `y = x·W`; [`Affine`] adds a bias, `y = x·W + b`.
//! Weights are stored `(in_features, out_features)`, so a batch `(N, in)`
//! maps to `(N, out)` without transposing on the forward path.

use crate::nn::{CachePolicy, ForwardCache, Layer};
use crate::tensor::{ops, Matrix, TensorData, TensorError, Vector};
use log::trace;
use ndarray::{ArrayViewD, ArrayViewMut1, ArrayViewMut2, ArrayViewMutD};

/// Linear transform without bias.
///
/// Parameter order: `[weight]`.
#[derive(Debug, Clone)]
pub struct MatMul {
    name: &'static str,
    weight: Matrix,
    weight_grad: Matrix,
    cache: ForwardCache<Matrix>,
}

impl MatMul {
    /// Wraps an `(in_features, out_features)` weight matrix.
    pub fn new(weight: Matrix) -> Self {
        Self::named("MatMul", weight)
    }

    fn named(name: &'static str, weight: Matrix) -> Self {
        let weight_grad = Matrix::zeros(weight.raw_dim());
        MatMul {
            name,
            weight,
            weight_grad,
            cache: ForwardCache::new(name, CachePolicy::default()),
        }
    }

    /// Builder-style cache policy override.
    pub fn with_policy(mut self, policy: CachePolicy) -> Self {
        self.cache.set_policy(policy);
        self
    }

    pub fn weight(&self) -> &Matrix {
        &self.weight
    }

    /// Mutable view of the weight. Contents may change, the shape may not.
    pub fn weight_mut(&mut self) -> ArrayViewMut2<'_, TensorData> {
        self.weight.view_mut()
    }

    /// Gradient of the most recent backward pass.
    pub fn weight_grad(&self) -> &Matrix {
        &self.weight_grad
    }

    pub fn in_features(&self) -> usize {
        self.weight.nrows()
    }

    pub fn out_features(&self) -> usize {
        self.weight.ncols()
    }
}

impl Layer for MatMul {
    fn name(&self) -> &'static str {
        self.name
    }

    fn forward(&mut self, x: &Matrix) -> Result<Matrix, TensorError> {
        self.cache.check_forward()?;
        if x.ncols() != self.in_features() {
            return Err(TensorError::ShapeMismatch {
                op: "linear forward",
                expected: vec![x.nrows(), self.in_features()],
                got: x.shape().to_vec(),
            });
        }
        let out = ops::matmul(x, &self.weight)?;
        trace!("{} forward {:?} -> {:?}", self.name, x.dim(), out.dim());
        self.cache.prime(x.clone());
        Ok(out)
    }

    fn backward(&mut self, dout: &Matrix) -> Result<Matrix, TensorError> {
        let x = self.cache.get()?;
        let expected = [x.nrows(), self.out_features()];
        if dout.shape() != expected {
            return Err(TensorError::ShapeMismatch {
                op: "linear backward",
                expected: expected.to_vec(),
                got: dout.shape().to_vec(),
            });
        }
        let dx = ops::matmul_t(dout, &self.weight)?;
        let dw = ops::t_matmul(x, dout)?;
        self.weight_grad.assign(&dw);
        trace!("{} backward {:?} -> {:?}", self.name, dout.dim(), dx.dim());
        self.cache.clear();
        Ok(dx)
    }

    fn params(&self) -> Vec<ArrayViewD<'_, TensorData>> {
        vec![self.weight.view().into_dyn()]
    }

    fn grads(&self) -> Vec<ArrayViewD<'_, TensorData>> {
        vec![self.weight_grad.view().into_dyn()]
    }

    fn params_mut(&mut self) -> Vec<ArrayViewMutD<'_, TensorData>> {
        vec![self.weight.view_mut().into_dyn()]
    }

    fn params_and_grads_mut(
        &mut self,
    ) -> Vec<(ArrayViewMutD<'_, TensorData>, ArrayViewD<'_, TensorData>)> {
        vec![(
            self.weight.view_mut().into_dyn(),
            self.weight_grad.view().into_dyn(),
        )]
    }

    fn zero_grads(&mut self) {
        self.weight_grad.fill(0.0);
    }

    fn input_dim(&self) -> Option<usize> {
        Some(self.in_features())
    }

    fn output_dim(&self) -> Option<usize> {
        Some(self.out_features())
    }

    fn is_primed(&self) -> bool {
        self.cache.is_primed()
    }

    fn set_cache_policy(&mut self, policy: CachePolicy) {
        self.cache.set_policy(policy);
    }
}

/// Linear transform with bias, broadcast across the batch axis.
///
/// Parameter order: `[weight, bias]`.
#[derive(Debug, Clone)]
pub struct Affine {
    matmul: MatMul,
    bias: Vector,
    bias_grad: Vector,
}

impl Affine {
    /// Wraps an `(in_features, out_features)` weight and an `(out_features,)` bias.
    pub fn new(weight: Matrix, bias: Vector) -> Result<Self, TensorError> {
        if bias.len() != weight.ncols() {
            return Err(TensorError::shape(
                "Affine::new",
                &[weight.ncols()],
                bias.shape(),
            ));
        }
        let bias_grad = Vector::zeros(bias.len());
        Ok(Affine {
            matmul: MatMul::named("Affine", weight),
            bias,
            bias_grad,
        })
    }

    /// Builder-style cache policy override.
    pub fn with_policy(mut self, policy: CachePolicy) -> Self {
        self.matmul.cache.set_policy(policy);
        self
    }

    pub fn weight(&self) -> &Matrix {
        self.matmul.weight()
    }

    /// Mutable view of the weight. Contents may change, the shape may not.
    pub fn weight_mut(&mut self) -> ArrayViewMut2<'_, TensorData> {
        self.matmul.weight_mut()
    }

    pub fn bias(&self) -> &Vector {
        &self.bias
    }

    /// Mutable view of the bias. Contents may change, the shape may not.
    pub fn bias_mut(&mut self) -> ArrayViewMut1<'_, TensorData> {
        self.bias.view_mut()
    }

    pub fn weight_grad(&self) -> &Matrix {
        self.matmul.weight_grad()
    }

    pub fn bias_grad(&self) -> &Vector {
        &self.bias_grad
    }

    pub fn in_features(&self) -> usize {
        self.matmul.in_features()
    }

    pub fn out_features(&self) -> usize {
        self.matmul.out_features()
    }
}

impl Layer for Affine {
    fn name(&self) -> &'static str {
        "Affine"
    }

    fn forward(&mut self, x: &Matrix) -> Result<Matrix, TensorError> {
        let out = self.matmul.forward(x)?;
        ops::add_bias(out, &self.bias)
    }

    fn backward(&mut self, dout: &Matrix) -> Result<Matrix, TensorError> {
        // matmul validates dout against the cached batch before anything is written
        let dx = self.matmul.backward(dout)?;
        self.bias_grad.assign(&ops::sum_batch(dout));
        Ok(dx)
    }

    fn params(&self) -> Vec<ArrayViewD<'_, TensorData>> {
        vec![
            self.matmul.weight.view().into_dyn(),
            self.bias.view().into_dyn(),
        ]
    }

    fn grads(&self) -> Vec<ArrayViewD<'_, TensorData>> {
        vec![
            self.matmul.weight_grad.view().into_dyn(),
            self.bias_grad.view().into_dyn(),
        ]
    }

    fn params_mut(&mut self) -> Vec<ArrayViewMutD<'_, TensorData>> {
        vec![
            self.matmul.weight.view_mut().into_dyn(),
            self.bias.view_mut().into_dyn(),
        ]
    }

    fn params_and_grads_mut(
        &mut self,
    ) -> Vec<(ArrayViewMutD<'_, TensorData>, ArrayViewD<'_, TensorData>)> {
        vec![
            (
                self.matmul.weight.view_mut().into_dyn(),
                self.matmul.weight_grad.view().into_dyn(),
            ),
            (self.bias.view_mut().into_dyn(), self.bias_grad.view().into_dyn()),
        ]
    }

    fn zero_grads(&mut self) {
        self.matmul.zero_grads();
        self.bias_grad.fill(0.0);
    }

    fn input_dim(&self) -> Option<usize> {
        Some(self.in_features())
    }

    fn output_dim(&self) -> Option<usize> {
        Some(self.out_features())
    }

    fn is_primed(&self) -> bool {
        self.matmul.is_primed()
    }

    fn set_cache_policy(&mut self, policy: CachePolicy) {
        self.matmul.set_cache_policy(policy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    fn affine() -> Affine {
        Affine::new(
            arr2(&[[1.0, 0.0, -1.0], [2.0, 1.0, 0.5]]),
            arr1(&[0.5, -0.5, 1.0]),
        )
        .unwrap()
    }

    #[test]
    fn affine_forward_is_xw_plus_b() {
        let mut layer = affine();
        let x = arr2(&[[1.0, 1.0], [0.0, 2.0]]);
        let out = layer.forward(&x).unwrap();
        assert_eq!(out, arr2(&[[3.5, 0.5, 0.5], [4.5, 1.5, 2.0]]));
        assert!(layer.is_primed());
    }

    #[test]
    fn affine_backward_writes_both_gradients() {
        let mut layer = affine();
        let x = arr2(&[[1.0, 1.0], [0.0, 2.0]]);
        layer.forward(&x).unwrap();
        let dout = arr2(&[[1.0, 0.0, 1.0], [0.0, 1.0, 2.0]]);
        let dx = layer.backward(&dout).unwrap();

        assert_eq!(dx, arr2(&[[0.0, 2.5], [-2.0, 2.0]]));
        assert_eq!(
            layer.weight_grad(),
            &arr2(&[[1.0, 0.0, 1.0], [1.0, 2.0, 5.0]])
        );
        assert_eq!(layer.bias_grad(), &arr1(&[1.0, 1.0, 3.0]));
        assert!(!layer.is_primed());
    }

    #[test]
    fn gradients_are_replaced_not_accumulated() {
        let mut layer = affine();
        let x = arr2(&[[1.0, 1.0]]);
        let dout = arr2(&[[1.0, 1.0, 1.0]]);
        for _ in 0..3 {
            layer.forward(&x).unwrap();
            layer.backward(&dout).unwrap();
        }
        assert_eq!(layer.bias_grad(), &arr1(&[1.0, 1.0, 1.0]));
        assert_eq!(layer.weight_grad(), &Matrix::ones((2, 3)));
    }

    #[test]
    fn bias_must_match_weight_columns() {
        let err = Affine::new(Matrix::zeros((2, 3)), Vector::zeros(2)).unwrap_err();
        assert_eq!(
            err,
            TensorError::ShapeMismatch {
                op: "Affine::new",
                expected: vec![3],
                got: vec![2],
            }
        );
    }

    #[test]
    fn forward_rejects_wrong_feature_dimension() {
        let mut layer = affine();
        let err = layer.forward(&Matrix::zeros((4, 3))).unwrap_err();
        assert!(matches!(err, TensorError::ShapeMismatch { .. }));
        assert!(!layer.is_primed());
    }

    #[test]
    fn backward_without_forward_is_uninitialized() {
        let mut layer = affine();
        let err = layer.backward(&Matrix::zeros((1, 3))).unwrap_err();
        assert_eq!(err, TensorError::UninitializedState { layer: "Affine" });

        let mut matmul = MatMul::new(Matrix::zeros((2, 2)));
        let err = matmul.backward(&Matrix::zeros((1, 2))).unwrap_err();
        assert_eq!(err, TensorError::UninitializedState { layer: "MatMul" });
    }

    #[test]
    fn second_backward_is_uninitialized() {
        let mut layer = MatMul::new(Matrix::eye(2));
        layer.forward(&Matrix::ones((1, 2))).unwrap();
        layer.backward(&Matrix::ones((1, 2))).unwrap();
        assert!(matches!(
            layer.backward(&Matrix::ones((1, 2))),
            Err(TensorError::UninitializedState { .. })
        ));
    }

    #[test]
    fn backward_rejects_batch_mismatch_and_stays_primed() {
        let mut layer = affine();
        layer.forward(&Matrix::ones((2, 2))).unwrap();
        let err = layer.backward(&Matrix::ones((3, 3))).unwrap_err();
        assert_eq!(
            err,
            TensorError::ShapeMismatch {
                op: "linear backward",
                expected: vec![2, 3],
                got: vec![3, 3],
            }
        );
        assert!(layer.is_primed());
        assert_eq!(layer.bias_grad(), &Vector::zeros(3));
        assert!(layer.backward(&Matrix::ones((2, 3))).is_ok());
    }

    #[test]
    fn strict_policy_rejects_interleaved_forward() {
        let mut layer = MatMul::new(Matrix::eye(2)).with_policy(CachePolicy::Strict);
        layer.forward(&Matrix::ones((1, 2))).unwrap();
        assert_eq!(
            layer.forward(&Matrix::ones((1, 2))),
            Err(TensorError::StaleState { layer: "MatMul" })
        );
        layer.backward(&Matrix::ones((1, 2))).unwrap();
        assert!(layer.forward(&Matrix::ones((1, 2))).is_ok());
    }

    #[test]
    fn matmul_has_single_parameter() {
        let mut layer = MatMul::new(Matrix::zeros((4, 2)));
        assert_eq!(layer.params().len(), 1);
        assert_eq!(layer.grads().len(), 1);
        assert_eq!(layer.params()[0].shape(), &[4, 2]);
        assert_eq!(layer.params_and_grads_mut().len(), 1);
        assert_eq!(layer.input_dim(), Some(4));
        assert_eq!(layer.output_dim(), Some(2));
    }

    #[test]
    fn param_views_alias_layer_storage() {
        let mut layer = affine();
        layer.params_mut()[1].fill(7.0);
        assert_eq!(layer.bias(), &arr1(&[7.0, 7.0, 7.0]));
        assert_eq!(layer.grads()[0].as_ptr(), layer.weight_grad().as_ptr());
    }

    #[test]
    fn mutable_accessors_keep_parameter_shapes() {
        let mut layer = affine();
        layer.weight_mut().assign(&Matrix::ones((2, 3)));
        layer.bias_mut().fill(0.0);
        layer.weight_mut()[[0, 0]] = 2.0;
        assert_eq!(layer.weight().dim(), (2, 3));
        assert_eq!(layer.bias().len(), 3);

        let shapes: Vec<Vec<usize>> = layer.params().iter().map(|p| p.shape().to_vec()).collect();
        let grad_shapes: Vec<Vec<usize>> = layer.grads().iter().map(|g| g.shape().to_vec()).collect();
        assert_eq!(shapes, grad_shapes);

        let out = layer.forward(&Matrix::ones((1, 2))).unwrap();
        assert_eq!(out, arr2(&[[3.0, 2.0, 2.0]]));
        let dx = layer.backward(&Matrix::ones((1, 3))).unwrap();
        assert_eq!(dx, arr2(&[[4.0, 3.0]]));
        assert_eq!(layer.weight_grad(), &Matrix::ones((2, 3)));
    }
}
