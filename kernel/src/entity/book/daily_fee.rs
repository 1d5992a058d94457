use error_stack::Report;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use vodca::{AsRefln, Fromln};

use crate::{ErrorDetail, KernelError};

// NUMERIC(7, 2)
const MAX_SCALE: u32 = 2;
const MAX_INTEGER_DIGITS: u32 = 5;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, Fromln, AsRefln)]
pub struct DailyFee(Decimal);

impl DailyFee {
    pub fn new(fee: impl Into<Decimal>) -> Self {
        Self(fee.into())
    }

    pub fn parse(fee: impl Into<Decimal>) -> error_stack::Result<Self, KernelError> {
        let fee = fee.into().normalize();
        if fee.is_sign_negative() && !fee.is_zero() {
            return Err(Report::new(KernelError::ValidationFailed)
                .attach_printable(ErrorDetail::new("daily_fee must not be negative")));
        }
        if fee.scale() > MAX_SCALE {
            return Err(Report::new(KernelError::ValidationFailed).attach_printable(
                ErrorDetail::new(format!(
                    "daily_fee must have at most {MAX_SCALE} decimal places"
                )),
            ));
        }
        if fee.trunc() >= Decimal::from(10_i64.pow(MAX_INTEGER_DIGITS)) {
            return Err(Report::new(KernelError::ValidationFailed).attach_printable(
                ErrorDetail::new(format!(
                    "daily_fee must have at most {MAX_INTEGER_DIGITS} digits before the decimal point"
                )),
            ));
        }
        Ok(Self(fee))
    }
}
