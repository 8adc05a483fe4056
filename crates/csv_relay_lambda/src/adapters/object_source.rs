use csv_relay_core::notification::ObjectRef;

pub trait ObjectSource {
    /// Blocking read of the full object body.
    fn fetch_object(&self, object: &ObjectRef) -> Result<Vec<u8>, String>;
}
