// Copyright (c) 2022-2023 The MobileCoin Foundation

use super::registration::Registration;

/// Container for the active signing sub-session, ensuring sessions are wiped
/// (via [Drop]) when replaced or cleared
pub struct Function {
    inner: FunctionType,
}

impl Default for Function {
    fn default() -> Self {
        Self::new()
    }
}

/// Enum for internal state machines, one per signing sub-protocol
enum FunctionType {
    None,

    Registration(Registration),
}

impl Function {
    /// Create a new / empty function context
    pub const fn new() -> Self {
        Self {
            inner: FunctionType::None,
        }
    }

    /// Setup a new registration context
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn registration_init(&mut self) -> &mut Registration {
        // Clear function prior to init (executes drop)
        self.clear();

        self.inner = FunctionType::Registration(Registration::new());

        match &mut self.inner {
            FunctionType::Registration(r) => r,
            FunctionType::None => unreachable!(),
        }
    }

    /// Fetch registration context
    pub fn registration(&mut self) -> Option<&mut Registration> {
        match &mut self.inner {
            FunctionType::Registration(r) => Some(r),
            _ => None,
        }
    }

    /// Fetch registration context
    pub fn registration_ref(&self) -> Option<&Registration> {
        match &self.inner {
            FunctionType::Registration(r) => Some(r),
            _ => None,
        }
    }

    /// Clear context, executing drop if required
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn clear(&mut self) {
        self.inner = FunctionType::None;
    }
}
