/// The widget that displays the query text. Notified when a query is replayed.
pub trait QueryEditor: Send + Sync {
    fn set_value(&self, text: &str);
}
