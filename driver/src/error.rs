use error_stack::Report;
use kernel::KernelError;

/// Lifts a foreign error into a `Report<KernelError>` with a fitting context.
pub trait ConvertError {
    type Ok;
    fn convert_error(self) -> error_stack::Result<Self::Ok, KernelError>;
}

impl<T> ConvertError for Result<T, serde_json::Error> {
    type Ok = T;
    fn convert_error(self) -> error_stack::Result<T, KernelError> {
        self.map_err(|error| Report::new(error).change_context(KernelError::Internal))
    }
}

impl<T> ConvertError for Result<T, reqwest::Error> {
    type Ok = T;
    fn convert_error(self) -> error_stack::Result<T, KernelError> {
        self.map_err(|error| {
            let context = if error.is_timeout() {
                KernelError::Timeout
            } else {
                KernelError::Internal
            };
            Report::new(error).change_context(context)
        })
    }
}
