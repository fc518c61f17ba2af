//! Safe Rust wrappers for ONNX Runtime Env, Session, and Tensor.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};
use std::path::Path;
use std::ptr;
use std::sync::Arc;

use crate::error::OnnxError;
use crate::ffi::{self, Api};

/// Severity threshold passed to the runtime when creating an [`Env`].
#[repr(u32)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoggingLevel {
    Verbose = 0,
    Info = 1,
    #[default]
    Warning = 2,
    Error = 3,
    Fatal = 4,
}

/// Converts an OrtStatus to a Rust Result.
///
/// A null status means success. A non-null status carries an opaque
/// message and must be released after reading it.
fn check_status(api: &Api, status: *mut ffi::OrtStatus) -> Result<(), OnnxError> {
    if status.is_null() {
        return Ok(());
    }
    let msg = unsafe {
        let ptr = (api.get_error_message)(status);
        let s = if ptr.is_null() {
            "unknown error".to_string()
        } else {
            CStr::from_ptr(ptr).to_string_lossy().into_owned()
        };
        (api.release_status)(status);
        s
    };
    Err(OnnxError::Runtime(msg))
}

fn c_string(s: &str) -> Result<CString, OnnxError> {
    CString::new(s).map_err(|e| OnnxError::Runtime(e.to_string()))
}

// ---------------------------------------------------------------------------
// Env
// ---------------------------------------------------------------------------

/// ONNX Runtime environment. Create one per process.
///
/// Sessions hold an `Arc` to the environment they were created under,
/// so an environment is only released once every session created from
/// it is gone.
pub struct Env {
    raw: *mut ffi::OrtEnv,
}

unsafe impl Send for Env {}
unsafe impl Sync for Env {}

impl Env {
    /// Creates a new ONNX Runtime environment.
    pub fn new(name: &str, level: LoggingLevel) -> Result<Arc<Self>, OnnxError> {
        let api = ffi::api()?;
        let c_name = c_string(name)?;
        let mut raw: *mut ffi::OrtEnv = ptr::null_mut();
        check_status(api, unsafe {
            (api.create_env)(level as u32, c_name.as_ptr(), &mut raw)
        })?;
        Ok(Arc::new(Self { raw }))
    }
}

impl Drop for Env {
    fn drop(&mut self) {
        if !self.raw.is_null() {
            if let Ok(api) = ffi::api() {
                unsafe { (api.release_env)(self.raw) };
            }
            self.raw = ptr::null_mut();
        }
    }
}

// ---------------------------------------------------------------------------
// SessionOptions
// ---------------------------------------------------------------------------

/// Session construction options.
pub struct SessionOptions {
    raw: *mut ffi::OrtSessionOptions,
}

unsafe impl Send for SessionOptions {}

impl SessionOptions {
    pub fn new() -> Result<Self, OnnxError> {
        let api = ffi::api()?;
        let mut raw: *mut ffi::OrtSessionOptions = ptr::null_mut();
        check_status(api, unsafe { (api.create_session_options)(&mut raw) })?;
        Ok(Self { raw })
    }

    /// Sets the number of threads used to parallelize execution within
    /// graph nodes.
    pub fn set_intra_threads(&mut self, n: usize) -> Result<(), OnnxError> {
        let api = ffi::api()?;
        check_status(api, unsafe {
            (api.set_intra_op_num_threads)(self.raw, n.max(1) as c_int)
        })
    }
}

impl Drop for SessionOptions {
    fn drop(&mut self) {
        if !self.raw.is_null() {
            if let Ok(api) = ffi::api() {
                unsafe { (api.release_session_options)(self.raw) };
            }
            self.raw = ptr::null_mut();
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Holds a loaded ONNX model.
pub struct Session {
    raw: *mut ffi::OrtSession,
    _env: Arc<Env>,
}

unsafe impl Send for Session {}
unsafe impl Sync for Session {}

impl Session {
    /// Loads a model from a filesystem path into a runnable session
    /// bound to `env`.
    pub fn new(
        env: &Arc<Env>,
        model_path: &Path,
        options: &SessionOptions,
    ) -> Result<Self, OnnxError> {
        if !model_path.exists() {
            return Err(OnnxError::ModelNotFound(model_path.to_path_buf()));
        }
        let api = ffi::api()?;
        let c_path = c_string(&model_path.to_string_lossy())?;

        let mut raw: *mut ffi::OrtSession = ptr::null_mut();
        check_status(api, unsafe {
            (api.create_session)(env.raw, c_path.as_ptr(), options.raw, &mut raw)
        })?;

        Ok(Self {
            raw,
            _env: Arc::clone(env),
        })
    }

    /// Runs inference with the given inputs and output names.
    ///
    /// Synchronous and blocking; the call returns once the engine has
    /// produced every requested output.
    pub fn run(
        &self,
        input_names: &[&str],
        inputs: &[&Tensor],
        output_names: &[&str],
    ) -> Result<Vec<Tensor>, OnnxError> {
        if input_names.len() != inputs.len() {
            return Err(OnnxError::Runtime(format!(
                "input names/tensors length mismatch: {} vs {}",
                input_names.len(),
                inputs.len()
            )));
        }

        let api = ffi::api()?;

        let c_input_names: Vec<CString> = input_names
            .iter()
            .map(|n| c_string(n))
            .collect::<Result<_, _>>()?;
        let c_input_ptrs: Vec<*const c_char> =
            c_input_names.iter().map(|s| s.as_ptr()).collect();

        let c_inputs: Vec<*const ffi::OrtValue> =
            inputs.iter().map(|t| t.value as *const _).collect();

        let c_output_names: Vec<CString> = output_names
            .iter()
            .map(|n| c_string(n))
            .collect::<Result<_, _>>()?;
        let c_output_ptrs: Vec<*const c_char> =
            c_output_names.iter().map(|s| s.as_ptr()).collect();

        let mut c_outputs: Vec<*mut ffi::OrtValue> = vec![ptr::null_mut(); output_names.len()];

        check_status(api, unsafe {
            (api.run_session)(
                self.raw,
                ptr::null_mut(),
                c_input_ptrs.as_ptr(),
                c_inputs.as_ptr(),
                inputs.len(),
                c_output_ptrs.as_ptr(),
                output_names.len(),
                c_outputs.as_mut_ptr(),
            )
        })?;

        let mut outputs = Vec::with_capacity(c_outputs.len());
        for (i, v) in c_outputs.into_iter().enumerate() {
            if v.is_null() {
                return Err(OnnxError::Runtime(format!(
                    "engine returned null value for output {:?}",
                    output_names[i]
                )));
            }
            outputs.push(Tensor {
                value: v,
                _pinned: None,
            });
        }

        Ok(outputs)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.raw.is_null() {
            if let Ok(api) = ffi::api() {
                unsafe { (api.release_session)(self.raw) };
            }
            self.raw = ptr::null_mut();
        }
    }
}

// ---------------------------------------------------------------------------
// Tensor
// ---------------------------------------------------------------------------

/// Element types supported by [`Tensor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    F32,
    I16,
}

// Keeps tensor backing storage alive; the engine borrows the buffer
// rather than copying it.
#[derive(Debug)]
enum Pinned {
    F32(#[allow(dead_code)] Vec<f32>),
    I16(#[allow(dead_code)] Vec<i16>),
}

/// N-dimensional tensor backed by an `OrtValue`.
#[derive(Debug)]
pub struct Tensor {
    value: *mut ffi::OrtValue,
    _pinned: Option<Pinned>,
}

unsafe impl Send for Tensor {}

impl Tensor {
    /// Creates a float32 tensor with the given shape and data.
    pub fn from_f32(shape: &[i64], data: Vec<f32>) -> Result<Self, OnnxError> {
        let total = checked_len(shape, data.len())?;
        let mut owned = data;
        owned.truncate(total);
        let bytes = total * size_of::<f32>();
        let value = create_value(
            owned.as_mut_ptr() as *mut c_void,
            bytes,
            shape,
            ffi::ELEMENT_TYPE_FLOAT,
        )?;
        Ok(Self {
            value,
            _pinned: Some(Pinned::F32(owned)),
        })
    }

    /// Creates an int16 tensor with the given shape and data.
    ///
    /// PCM16 audio maps onto this directly; [`Tensor::float_data`]
    /// rescales it back to [-1, 1].
    pub fn from_i16(shape: &[i64], data: Vec<i16>) -> Result<Self, OnnxError> {
        let total = checked_len(shape, data.len())?;
        let mut owned = data;
        owned.truncate(total);
        let bytes = total * size_of::<i16>();
        let value = create_value(
            owned.as_mut_ptr() as *mut c_void,
            bytes,
            shape,
            ffi::ELEMENT_TYPE_INT16,
        )?;
        Ok(Self {
            value,
            _pinned: Some(Pinned::I16(owned)),
        })
    }

    /// Returns the tensor dimensions.
    pub fn shape(&self) -> Result<Vec<i64>, OnnxError> {
        let api = ffi::api()?;
        self.with_shape_info(api, |api, info| {
            let mut ndim: usize = 0;
            check_status(api, unsafe { (api.get_dimensions_count)(info, &mut ndim) })?;
            if ndim == 0 {
                return Ok(Vec::new());
            }
            let mut dims = vec![0i64; ndim];
            check_status(api, unsafe {
                (api.get_dimensions)(info, dims.as_mut_ptr(), ndim)
            })?;
            Ok(dims)
        })
    }

    /// Returns the element type.
    pub fn element_type(&self) -> Result<ElementType, OnnxError> {
        let api = ffi::api()?;
        let raw = self.with_shape_info(api, |api, info| {
            let mut ty: c_int = 0;
            check_status(api, unsafe { (api.get_tensor_element_type)(info, &mut ty) })?;
            Ok(ty)
        })?;
        match raw {
            ffi::ELEMENT_TYPE_FLOAT => Ok(ElementType::F32),
            ffi::ELEMENT_TYPE_INT16 => Ok(ElementType::I16),
            other => Err(OnnxError::Runtime(format!(
                "unsupported tensor element type {other}"
            ))),
        }
    }

    /// Copies the tensor data out as f32. Int16 tensors are rescaled
    /// to [-1, 1].
    pub fn float_data(&self) -> Result<Vec<f32>, OnnxError> {
        let api = ffi::api()?;
        let shape = self.shape()?;
        let total = element_count(&shape)?;
        if total == 0 {
            return Ok(Vec::new());
        }

        let mut data: *mut c_void = ptr::null_mut();
        check_status(api, unsafe {
            (api.get_tensor_mutable_data)(self.value, &mut data)
        })?;
        if data.is_null() {
            return Err(OnnxError::Runtime("null tensor data".into()));
        }

        match self.element_type()? {
            ElementType::F32 => {
                let mut out = vec![0.0f32; total];
                unsafe {
                    ptr::copy_nonoverlapping(data as *const f32, out.as_mut_ptr(), total);
                }
                Ok(out)
            }
            ElementType::I16 => {
                let raw = unsafe { std::slice::from_raw_parts(data as *const i16, total) };
                Ok(raw.iter().map(|&v| v as f32 / 32767.0).collect())
            }
        }
    }

    fn with_shape_info<T>(
        &self,
        api: &'static Api,
        f: impl FnOnce(&'static Api, *const ffi::OrtTensorTypeAndShapeInfo) -> Result<T, OnnxError>,
    ) -> Result<T, OnnxError> {
        let mut info: *mut ffi::OrtTensorTypeAndShapeInfo = ptr::null_mut();
        check_status(api, unsafe {
            (api.get_tensor_type_and_shape_info)(self.value, &mut info)
        })?;
        let result = f(api, info);
        unsafe { (api.release_tensor_type_and_shape_info)(info) };
        result
    }
}

impl Drop for Tensor {
    fn drop(&mut self) {
        if !self.value.is_null() {
            if let Ok(api) = ffi::api() {
                unsafe { (api.release_value)(self.value) };
            }
            self.value = ptr::null_mut();
        }
    }
}

/// Number of elements implied by a shape. Dynamic (negative) dims are
/// rejected; a concrete tensor always has concrete dims.
fn element_count(shape: &[i64]) -> Result<usize, OnnxError> {
    let mut total: usize = 1;
    for &d in shape {
        if d < 0 {
            return Err(OnnxError::Runtime(format!("dynamic dimension in shape {shape:?}")));
        }
        total = total
            .checked_mul(d as usize)
            .ok_or_else(|| OnnxError::Runtime(format!("shape overflow: {shape:?}")))?;
    }
    Ok(total)
}

fn checked_len(shape: &[i64], got: usize) -> Result<usize, OnnxError> {
    if got == 0 {
        return Err(OnnxError::EmptyData);
    }
    let total = element_count(shape)?;
    if got < total {
        return Err(OnnxError::Runtime(format!(
            "tensor data too short: got {got}, need {total}"
        )));
    }
    Ok(total)
}

fn create_value(
    data: *mut c_void,
    data_len_bytes: usize,
    shape: &[i64],
    element_type: c_int,
) -> Result<*mut ffi::OrtValue, OnnxError> {
    let api = ffi::api()?;

    let mut mem_info: *mut ffi::OrtMemoryInfo = ptr::null_mut();
    check_status(api, unsafe {
        (api.create_cpu_memory_info)(ffi::ORT_ARENA_ALLOCATOR, ffi::ORT_MEM_TYPE_DEFAULT, &mut mem_info)
    })?;

    let mut value: *mut ffi::OrtValue = ptr::null_mut();
    let status = unsafe {
        (api.create_tensor_with_data)(
            mem_info,
            data,
            data_len_bytes,
            shape.as_ptr(),
            shape.len(),
            element_type,
            &mut value,
        )
    };
    unsafe { (api.release_memory_info)(mem_info) };
    check_status(api, status)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime_available() -> bool {
        ffi::api().is_ok()
    }

    #[test]
    fn element_count_rejects_dynamic_dims() {
        assert!(element_count(&[1, -1, 80]).is_err());
        assert_eq!(element_count(&[2, 3, 4]).unwrap(), 24);
        assert_eq!(element_count(&[]).unwrap(), 1);
    }

    #[test]
    fn checked_len_rejects_empty_and_short() {
        assert!(matches!(checked_len(&[1], 0), Err(OnnxError::EmptyData)));
        assert!(checked_len(&[3, 4], 6).is_err());
        assert_eq!(checked_len(&[3, 4], 12).unwrap(), 12);
    }

    #[test]
    fn logging_level_values() {
        assert_eq!(LoggingLevel::Verbose as u32, 0);
        assert_eq!(LoggingLevel::Fatal as u32, 4);
        assert_eq!(LoggingLevel::default(), LoggingLevel::Warning);
    }

    #[test]
    fn tensor_create_without_runtime_reports_library_error() {
        if runtime_available() {
            return;
        }
        match Tensor::from_f32(&[2, 2], vec![0.0; 4]) {
            Err(OnnxError::Library(_)) => {}
            other => panic!("expected Library error, got {other:?}"),
        }
    }

    // Exercised only where the shared library is installed.
    #[test]
    fn tensor_create_and_read() {
        if !runtime_available() {
            return;
        }
        let data: Vec<f32> = (0..12).map(|i| i as f32).collect();
        let tensor = Tensor::from_f32(&[3, 4], data.clone()).unwrap();
        assert_eq!(tensor.shape().unwrap(), vec![3, 4]);
        assert_eq!(tensor.float_data().unwrap(), data);
    }

    #[test]
    fn i16_tensor_reads_back_scaled() {
        if !runtime_available() {
            return;
        }
        let tensor = Tensor::from_i16(&[1, 2], vec![16384, -16384]).unwrap();
        let out = tensor.float_data().unwrap();
        assert!((out[0] - 0.5).abs() < 0.01);
        assert!((out[1] + 0.5).abs() < 0.01);
    }
}
