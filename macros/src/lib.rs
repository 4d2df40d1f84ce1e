use proc_macro::TokenStream;

mod attributes;
mod property;

/// Turns a `fn name(&self) -> V` of an inherent impl block into a cached property.
///
/// The body becomes the computation of an associated const `NAME: CachedProperty<Self, V>`, and
/// `name` into an accessor returning `Rc<V>`, which computes the value only if it isn't already
/// stored in the object's attribute table.
///
/// Arguments:
/// - `name = "..."`: the key the value is cached under, defaults to the method's name.
/// - `doc = "..."`: the property's documentation, defaults to the method's doc comments.
/// - `fallible`: the method returns `Result<V, E>`, errors are passed through and not cached.
#[proc_macro_attribute]
pub fn cached_property(attr: TokenStream, item: TokenStream) -> TokenStream {
    property::cached_property(attr, item)
}

/// Implements `HasAttributes` by returning the field marked with `#[attributes]`, or the field of
/// type `AttributeTable`.
#[proc_macro_derive(HasAttributes, attributes(attributes))]
pub fn has_attributes(input: TokenStream) -> TokenStream {
    attributes::has_attributes(input)
}
