//! Raw FFI surface for the ONNX Runtime C API.
//!
//! These declarations match `onnxruntime_c_api.h`. We hand-write them
//! for the subset we need, avoiding bindgen complexity. The library is
//! resolved at load time rather than link time, so the crate builds and
//! its structural tests run on machines without onnxruntime installed.

use std::os::raw::{c_char, c_int, c_void};
use std::path::PathBuf;

use libloading::Library;
use once_cell::sync::Lazy;

use crate::error::OnnxError;

// Opaque handle types, one per resource category. Empty enums rather
// than `c_void` aliases so an `*mut OrtEnv` cannot be passed where an
// `*mut OrtSession` is expected.
pub enum OrtEnv {}
pub enum OrtSession {}
pub enum OrtSessionOptions {}
pub enum OrtRunOptions {}
pub enum OrtMemoryInfo {}
pub enum OrtValue {}
pub enum OrtAllocator {}
pub enum OrtIoBinding {}
pub enum OrtStatus {}
pub enum OrtTensorTypeAndShapeInfo {}

/// Status codes carried by an `OrtStatus`.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrtErrorCode {
    Ok = 0,
    Fail = 1,
}

// OrtAllocatorType / OrtMemType values for OrtCreateCpuMemoryInfo.
pub const ORT_ARENA_ALLOCATOR: c_int = 1;
pub const ORT_MEM_TYPE_DEFAULT: c_int = 0;

// ONNXTensorElementDataType values.
pub const ELEMENT_TYPE_FLOAT: c_int = 1;
pub const ELEMENT_TYPE_INT16: c_int = 5;

// Core API. Symbol names, parameter order and count match the C header
// exactly; these aliases are what `Api` resolves from the library.
pub type OrtCreateEnvFn = unsafe extern "C" fn(
    logging_level: u32,
    logid: *const c_char,
    out: *mut *mut OrtEnv,
) -> *mut OrtStatus;

pub type OrtCreateSessionFn = unsafe extern "C" fn(
    env: *mut OrtEnv,
    model_path: *const c_char,
    options: *mut OrtSessionOptions,
    out: *mut *mut OrtSession,
) -> *mut OrtStatus;

pub type OrtRunSessionFn = unsafe extern "C" fn(
    sess: *mut OrtSession,
    run_options: *mut OrtRunOptions,
    input_names: *const *const c_char,
    input_values: *const *const OrtValue,
    input_count: usize,
    output_names: *const *const c_char,
    output_count: usize,
    output_values: *mut *mut OrtValue,
) -> *mut OrtStatus;

pub type OrtReleaseSessionFn = unsafe extern "C" fn(sess: *mut OrtSession);

pub type OrtReleaseEnvFn = unsafe extern "C" fn(env: *mut OrtEnv);

// Session options.
pub type OrtCreateSessionOptionsFn =
    unsafe extern "C" fn(out: *mut *mut OrtSessionOptions) -> *mut OrtStatus;
pub type OrtSetIntraOpNumThreadsFn = unsafe extern "C" fn(
    options: *mut OrtSessionOptions,
    num_threads: c_int,
) -> *mut OrtStatus;
pub type OrtReleaseSessionOptionsFn = unsafe extern "C" fn(options: *mut OrtSessionOptions);

// Memory info.
pub type OrtCreateCpuMemoryInfoFn = unsafe extern "C" fn(
    allocator_type: c_int,
    mem_type: c_int,
    out: *mut *mut OrtMemoryInfo,
) -> *mut OrtStatus;
pub type OrtReleaseMemoryInfoFn = unsafe extern "C" fn(info: *mut OrtMemoryInfo);

// Values (tensors).
pub type OrtCreateTensorWithDataAsOrtValueFn = unsafe extern "C" fn(
    info: *mut OrtMemoryInfo,
    data: *mut c_void,
    data_len_bytes: usize,
    shape: *const i64,
    shape_len: usize,
    element_type: c_int,
    out: *mut *mut OrtValue,
) -> *mut OrtStatus;
pub type OrtGetTensorMutableDataFn =
    unsafe extern "C" fn(value: *mut OrtValue, out: *mut *mut c_void) -> *mut OrtStatus;
pub type OrtGetTensorTypeAndShapeInfoFn = unsafe extern "C" fn(
    value: *const OrtValue,
    out: *mut *mut OrtTensorTypeAndShapeInfo,
) -> *mut OrtStatus;
pub type OrtGetTensorElementTypeFn = unsafe extern "C" fn(
    info: *const OrtTensorTypeAndShapeInfo,
    out: *mut c_int,
) -> *mut OrtStatus;
pub type OrtGetDimensionsCountFn = unsafe extern "C" fn(
    info: *const OrtTensorTypeAndShapeInfo,
    out: *mut usize,
) -> *mut OrtStatus;
pub type OrtGetDimensionsFn = unsafe extern "C" fn(
    info: *const OrtTensorTypeAndShapeInfo,
    dims: *mut i64,
    dims_len: usize,
) -> *mut OrtStatus;
pub type OrtReleaseTensorTypeAndShapeInfoFn =
    unsafe extern "C" fn(info: *mut OrtTensorTypeAndShapeInfo);
pub type OrtReleaseValueFn = unsafe extern "C" fn(value: *mut OrtValue);

// Status.
pub type OrtGetErrorMessageFn =
    unsafe extern "C" fn(status: *const OrtStatus) -> *const c_char;
pub type OrtReleaseStatusFn = unsafe extern "C" fn(status: *mut OrtStatus);

/// Resolved function table for the ONNX Runtime library.
///
/// Function pointers stay valid for as long as the `Library` they came
/// from is alive; the table owns the library, and lives in a process
/// global, so they are effectively `'static`.
pub struct Api {
    pub create_env: OrtCreateEnvFn,
    pub create_session: OrtCreateSessionFn,
    pub run_session: OrtRunSessionFn,
    pub release_session: OrtReleaseSessionFn,
    pub release_env: OrtReleaseEnvFn,

    pub create_session_options: OrtCreateSessionOptionsFn,
    pub set_intra_op_num_threads: OrtSetIntraOpNumThreadsFn,
    pub release_session_options: OrtReleaseSessionOptionsFn,

    pub create_cpu_memory_info: OrtCreateCpuMemoryInfoFn,
    pub release_memory_info: OrtReleaseMemoryInfoFn,

    pub create_tensor_with_data: OrtCreateTensorWithDataAsOrtValueFn,
    pub get_tensor_mutable_data: OrtGetTensorMutableDataFn,
    pub get_tensor_type_and_shape_info: OrtGetTensorTypeAndShapeInfoFn,
    pub get_tensor_element_type: OrtGetTensorElementTypeFn,
    pub get_dimensions_count: OrtGetDimensionsCountFn,
    pub get_dimensions: OrtGetDimensionsFn,
    pub release_tensor_type_and_shape_info: OrtReleaseTensorTypeAndShapeInfoFn,
    pub release_value: OrtReleaseValueFn,

    pub get_error_message: OrtGetErrorMessageFn,
    pub release_status: OrtReleaseStatusFn,

    _lib: Library,
}

/// Environment variable naming the onnxruntime shared library.
pub const ORT_DYLIB_PATH: &str = "ORT_DYLIB_PATH";

fn library_path() -> PathBuf {
    if let Ok(path) = std::env::var(ORT_DYLIB_PATH) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    let name = if cfg!(target_os = "macos") {
        "libonnxruntime.dylib"
    } else if cfg!(target_os = "windows") {
        "onnxruntime.dll"
    } else {
        "libonnxruntime.so"
    };
    PathBuf::from(name)
}

unsafe fn sym<T: Copy>(lib: &Library, name: &[u8]) -> Result<T, String> {
    match unsafe { lib.get::<T>(name) } {
        Ok(s) => Ok(*s),
        Err(e) => Err(format!(
            "missing symbol {}: {e}",
            String::from_utf8_lossy(&name[..name.len() - 1])
        )),
    }
}

impl Api {
    fn load() -> Result<Self, String> {
        let path = library_path();
        let lib = unsafe { Library::new(&path) }
            .map_err(|e| format!("{}: {e}", path.display()))?;

        unsafe {
            Ok(Self {
                create_env: sym(&lib, b"OrtCreateEnv\0")?,
                create_session: sym(&lib, b"OrtCreateSession\0")?,
                run_session: sym(&lib, b"OrtRunSession\0")?,
                release_session: sym(&lib, b"OrtReleaseSession\0")?,
                release_env: sym(&lib, b"OrtReleaseEnv\0")?,

                create_session_options: sym(&lib, b"OrtCreateSessionOptions\0")?,
                set_intra_op_num_threads: sym(&lib, b"OrtSetIntraOpNumThreads\0")?,
                release_session_options: sym(&lib, b"OrtReleaseSessionOptions\0")?,

                create_cpu_memory_info: sym(&lib, b"OrtCreateCpuMemoryInfo\0")?,
                release_memory_info: sym(&lib, b"OrtReleaseMemoryInfo\0")?,

                create_tensor_with_data: sym(&lib, b"OrtCreateTensorWithDataAsOrtValue\0")?,
                get_tensor_mutable_data: sym(&lib, b"OrtGetTensorMutableData\0")?,
                get_tensor_type_and_shape_info: sym(&lib, b"OrtGetTensorTypeAndShapeInfo\0")?,
                get_tensor_element_type: sym(&lib, b"OrtGetTensorElementType\0")?,
                get_dimensions_count: sym(&lib, b"OrtGetDimensionsCount\0")?,
                get_dimensions: sym(&lib, b"OrtGetDimensions\0")?,
                release_tensor_type_and_shape_info: sym(&lib, b"OrtReleaseTensorTypeAndShapeInfo\0")?,
                release_value: sym(&lib, b"OrtReleaseValue\0")?,

                get_error_message: sym(&lib, b"OrtGetErrorMessage\0")?,
                release_status: sym(&lib, b"OrtReleaseStatus\0")?,

                _lib: lib,
            })
        }
    }
}

static API: Lazy<Result<Api, String>> = Lazy::new(Api::load);

/// Returns the process-wide API table, loading the library on first use.
pub fn api() -> Result<&'static Api, OnnxError> {
    API.as_ref().map_err(|e| OnnxError::Library(e.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_values() {
        assert_eq!(OrtErrorCode::Ok as i32, 0);
        assert_eq!(OrtErrorCode::Fail as i32, 1);
    }

    #[test]
    fn handles_are_pointer_sized() {
        assert_eq!(size_of::<*mut OrtEnv>(), size_of::<usize>());
        assert_eq!(size_of::<*mut OrtSession>(), size_of::<usize>());
        assert_eq!(size_of::<*mut OrtValue>(), size_of::<usize>());
        assert_eq!(size_of::<*mut OrtStatus>(), size_of::<usize>());
        assert_eq!(size_of::<*mut OrtAllocator>(), size_of::<usize>());
        assert_eq!(size_of::<*mut OrtIoBinding>(), size_of::<usize>());
    }

    #[test]
    fn default_library_path_without_env() {
        // Only meaningful when the variable is unset, which is the
        // normal test environment.
        if std::env::var(ORT_DYLIB_PATH).is_err() {
            let path = library_path();
            assert!(path.to_string_lossy().contains("onnxruntime"));
        }
    }
}
