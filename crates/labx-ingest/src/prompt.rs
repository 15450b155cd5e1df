//! Human resolution of the reserved house customer.

use labx_model::{CustomerId, ExternalRequest};

/// Asks someone which real customer a batch of house requests belongs to.
///
/// Returning `None` cancels conversion of those requests.
pub trait CustomerPrompt {
    fn choose_customer(&mut self, requests: &[&ExternalRequest]) -> Option<CustomerId>;
}

impl<F> CustomerPrompt for F
where
    F: FnMut(&[&ExternalRequest]) -> Option<CustomerId>,
{
    fn choose_customer(&mut self, requests: &[&ExternalRequest]) -> Option<CustomerId> {
        self(requests)
    }
}

/// Answers every prompt with the same customer, or cancels when unset.
#[derive(Debug, Clone, Default)]
pub struct FixedCustomer(pub Option<CustomerId>);

impl CustomerPrompt for FixedCustomer {
    fn choose_customer(&mut self, _requests: &[&ExternalRequest]) -> Option<CustomerId> {
        self.0.clone()
    }
}
