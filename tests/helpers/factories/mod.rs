pub mod binding_factory;
pub mod source_factory;

#[cfg(test)]
mod binding_factory_test;
#[cfg(test)]
mod source_factory_test;

pub use binding_factory::BindingFactory;
pub use source_factory::SourceFactory;
