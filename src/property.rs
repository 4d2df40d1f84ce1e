use crate::table::HasAttributes;
use std::{any, convert::Infallible, fmt, rc::Rc};

/// An attribute of `O` that is computed on first read and then served from the object's
/// [`AttributeTable`](crate::AttributeTable).
///
/// A `CachedProperty` belongs to the type, not to an object: it is usually an associated const
/// (see [`macro@crate::cached_property`]) and shared by all instances. The cached values live in
/// each instance's table, under [`name`](Self::name).
///
/// Reading the attribute looks into the table first. Only if there is no value, the computation
/// is invoked and its result stored. Removing the value from the table makes the next read
/// recompute it.
pub struct CachedProperty<O, V, E = Infallible> {
    name: &'static str,
    source: &'static str,
    doc: Option<&'static str>,
    compute: Computation<O, V, E>,
}

enum Computation<O, V, E> {
    Infallible(fn(&O) -> V),
    Fallible(fn(&O) -> Result<V, E>),
}

impl<O, V> CachedProperty<O, V> {
    pub const fn new(name: &'static str, compute: fn(&O) -> V) -> Self {
        CachedProperty {
            name,
            source: name,
            doc: None,
            compute: Computation::Infallible(compute),
        }
    }
}

impl<O, V, E> CachedProperty<O, V, E> {
    /// A property whose computation may fail.
    ///
    /// Errors are returned to the reader as is, and nothing is cached for them.
    pub const fn fallible(name: &'static str, compute: fn(&O) -> Result<V, E>) -> Self {
        CachedProperty {
            name,
            source: name,
            doc: None,
            compute: Computation::Fallible(compute),
        }
    }

    pub const fn with_doc(self, doc: &'static str) -> Self {
        CachedProperty {
            doc: Some(doc),
            ..self
        }
    }

    /// Names the function that computes the value. Defaults to the property's name.
    pub const fn with_source(self, source: &'static str) -> Self {
        CachedProperty { source, ..self }
    }

    /// The key the value is cached under.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn doc(&self) -> Option<&'static str> {
        self.doc
    }

    /// The name of the function that computes the value.
    pub const fn source(&self) -> &'static str {
        self.source
    }

    /// Invokes the computation, bypassing the cache.
    pub fn compute(&self, owner: &O) -> Result<V, E> {
        match self.compute {
            Computation::Infallible(compute) => Ok(compute(owner)),
            Computation::Fallible(compute) => compute(owner),
        }
    }
}

impl<O, V, E> CachedProperty<O, V, E>
where
    O: HasAttributes,
    V: 'static,
{
    /// Returns the cached value, computing and caching it first if there is none.
    ///
    /// # Panics
    ///
    /// If the owner's table holds a value of another type under this property's name.
    pub fn try_get_shared(&self, owner: &O) -> Result<Rc<V>, E> {
        let table = owner.attributes();
        let cached = match table.get::<V>(self.name) {
            Ok(cached) => cached,
            Err(e) => panic!("{e}"),
        };
        if let Some(value) = cached {
            return Ok(value);
        }

        // No borrow of the table is held here, the computation may read other attributes.
        let value = Rc::new(self.compute(owner)?);
        table.store(self.name, value.clone());
        Ok(value)
    }

    pub fn try_get(&self, owner: &O) -> Result<V, E>
    where
        V: Clone,
    {
        self.try_get_shared(owner).map(|value| V::clone(&value))
    }

    pub fn is_cached(&self, owner: &O) -> bool {
        owner.attributes().contains(self.name)
    }
}

impl<O, V> CachedProperty<O, V>
where
    O: HasAttributes,
    V: 'static,
{
    pub fn get_shared(&self, owner: &O) -> Rc<V> {
        match self.try_get_shared(owner) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    pub fn get(&self, owner: &O) -> V
    where
        V: Clone,
    {
        V::clone(&self.get_shared(owner))
    }
}

// Derives would put bounds on `O`, `V`, and `E`.

impl<O, V, E> Clone for CachedProperty<O, V, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<O, V, E> Copy for CachedProperty<O, V, E> {}

impl<O, V, E> Clone for Computation<O, V, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<O, V, E> Copy for Computation<O, V, E> {}

/// Properties of the same owner and value type are equal if they cache under the same name, are
/// computed by functions of the same name, and carry the same documentation.
impl<O, V, E> PartialEq for CachedProperty<O, V, E> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.source == other.source && self.doc == other.doc
    }
}

impl<O, V, E> Eq for CachedProperty<O, V, E> {}

impl<O, V, E> fmt::Display for CachedProperty<O, V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<CachedProperty {}::{}", any::type_name::<O>(), self.source)?;
        if self.name != self.source {
            write!(f, " as `{}`", self.name)?;
        }
        f.write_str(">")
    }
}

impl<O, V, E> fmt::Debug for CachedProperty<O, V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let computation = match self.compute {
            Computation::Infallible(_) => "infallible",
            Computation::Fallible(_) => "fallible",
        };
        f.debug_struct("CachedProperty")
            .field("owner", &any::type_name::<O>())
            .field("name", &self.name)
            .field("source", &self.source)
            .field("value", &any::type_name::<V>())
            .field("computation", &computation)
            .field("doc", &self.doc)
            .finish()
    }
}
