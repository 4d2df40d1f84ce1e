//! Attributes that are computed on first read and then stored on the object.
//!
//! Each object carries an [`AttributeTable`]. A [`CachedProperty`], shared by all objects of a
//! type, looks into that table first and only computes the value if it is missing. Removing the
//! value from the table makes the next read compute it again.

// The macros refer to this crate as `::cached_property`.
extern crate self as cached_property;

mod error;
mod property;
mod table;

pub use cached_property_macros::{cached_property, HasAttributes};
pub use error::AttributeError;
pub use property::CachedProperty;
pub use table::{AttributeTable, HasAttributes};

#[cfg(test)]
mod tests {
    use std::{cell::Cell, f64::consts::PI, fmt::Display, rc::Rc};

    use crate::{cached_property, AttributeTable, CachedProperty, HasAttributes};

    #[derive(Debug, PartialEq)]
    enum ShapeError {
        NegativeRadius(f64),
    }

    #[derive(HasAttributes)]
    struct Circle {
        radius: Cell<f64>,
        evaluations: Cell<u32>,
        attributes: AttributeTable,
    }

    impl Circle {
        fn new(radius: f64) -> Self {
            Circle {
                radius: Cell::new(radius),
                evaluations: Cell::new(0),
                attributes: AttributeTable::new(),
            }
        }

        /// The area of the circle.
        #[cached_property]
        fn area(&self) -> f64 {
            self.evaluations.set(self.evaluations.get() + 1);
            PI * self.radius.get() * self.radius.get()
        }

        /// Twice the area of the circle.
        #[cached_property(doc = "Twice the area.")]
        fn double_area(&self) -> f64 {
            *self.area() * 2.0
        }

        #[cached_property(name = "circumference")]
        fn perimeter(&self) -> f64 {
            2.0 * PI * self.radius.get()
        }

        #[cached_property]
        #[deprecated(note = "use `diameter`")]
        #[must_use]
        fn width(&self) -> f64 {
            self.radius.get() * 2.0
        }

        #[cached_property(fallible)]
        fn diameter(&self) -> Result<f64, ShapeError> {
            let radius = self.radius.get();
            if radius < 0.0 {
                return Err(ShapeError::NegativeRadius(radius));
            }
            Ok(radius * 2.0)
        }
    }

    #[test]
    fn single_evaluation() {
        let circle = Circle::new(1.0);
        let first = circle.area();
        let second = circle.area();
        assert_eq!(*first, PI);
        assert_eq!(first, second);
        assert_eq!(circle.evaluations.get(), 1);
    }

    #[test]
    fn instances_are_isolated() {
        let small = Circle::new(1.0);
        let large = Circle::new(2.0);

        assert_eq!(*small.area(), PI);
        assert_eq!(large.evaluations.get(), 0);
        assert!(!Circle::AREA.is_cached(&large));

        assert_eq!(*large.area(), 4.0 * PI);
        assert_eq!(*small.area(), PI);
        assert_eq!(small.evaluations.get(), 1);
        assert_eq!(large.evaluations.get(), 1);
    }

    #[test]
    fn recomputes_after_removal() {
        let circle = Circle::new(1.0);
        let before = circle.area();

        circle.radius.set(2.0);
        assert_eq!(*circle.area(), PI);

        assert!(circle.attributes().remove(Circle::AREA.name()));
        assert!(!Circle::AREA.is_cached(&circle));
        assert_eq!(*circle.area(), 4.0 * PI);
        assert_eq!(circle.evaluations.get(), 2);

        // Values handed out earlier stay valid.
        assert_eq!(*before, PI);
    }

    #[test]
    fn recomputes_everything_after_clear() {
        let circle = Circle::new(1.0);
        circle.double_area();
        circle.perimeter();
        assert_eq!(circle.attributes().len(), 3);

        circle.radius.set(2.0);
        circle.attributes().clear();
        assert!(circle.attributes().is_empty());
        assert!(!Circle::AREA.is_cached(&circle));

        assert_eq!(*circle.double_area(), 8.0 * PI);
        assert_eq!(*circle.area(), 4.0 * PI);
        assert_eq!(*circle.perimeter(), 4.0 * PI);
        assert_eq!(circle.evaluations.get(), 2);
        assert_eq!(
            circle.attributes().names(),
            ["area", "circumference", "double_area"]
        );
    }

    #[test]
    fn direct_writes_take_precedence() {
        let circle = Circle::new(1.0);
        circle.area();
        circle.attributes().insert("area", 10.0_f64);
        assert_eq!(*circle.area(), 10.0);

        let fresh = Circle::new(1.0);
        fresh.attributes().insert("area", 3.0_f64);
        assert_eq!(*fresh.area(), 3.0);
        assert_eq!(fresh.evaluations.get(), 0);
    }

    #[test]
    fn type_level_access_does_not_compute() {
        let circle = Circle::new(1.0);
        let property: CachedProperty<Circle, f64> = Circle::AREA;
        assert_eq!(property, Circle::AREA);
        assert_eq!(property.name(), "area");
        assert_eq!(circle.evaluations.get(), 0);
        assert!(circle.attributes().is_empty());
    }

    #[test]
    fn explicit_names() {
        let circle = Circle::new(1.0);
        assert_eq!(Circle::PERIMETER.name(), "circumference");
        circle.perimeter();
        assert_eq!(circle.attributes().names(), ["circumference"]);
    }

    #[test]
    fn documentation() {
        assert_eq!(Circle::AREA.doc(), Some("The area of the circle."));
        assert_eq!(Circle::DOUBLE_AREA.doc(), Some("Twice the area."));
        assert_eq!(Circle::PERIMETER.doc(), None);
    }

    #[test]
    fn representation() {
        let display = Circle::AREA.to_string();
        assert!(display.starts_with("<CachedProperty "));
        assert!(display.ends_with("Circle::area>"));
        assert_eq!(display, Circle::AREA.to_string());
        assert!(format!("{:?}", Circle::DIAMETER).contains("fallible"));

        assert_eq!(Circle::PERIMETER.source(), "perimeter");
        assert!(Circle::PERIMETER
            .to_string()
            .ends_with("Circle::perimeter as `circumference`>"));
        assert_ne!(Circle::AREA.to_string(), Circle::DOUBLE_AREA.to_string());
    }

    #[test]
    fn nested_properties() {
        let circle = Circle::new(1.0);
        assert_eq!(*circle.double_area(), 2.0 * PI);
        assert_eq!(circle.attributes().names(), ["area", "double_area"]);

        circle.attributes().remove("area");
        assert_eq!(*circle.double_area(), 2.0 * PI);
        assert_eq!(circle.evaluations.get(), 1);
    }

    #[test]
    fn errors_are_passed_through_and_not_cached() {
        let circle = Circle::new(-1.0);
        assert_eq!(circle.diameter(), Err(ShapeError::NegativeRadius(-1.0)));
        assert!(!Circle::DIAMETER.is_cached(&circle));

        circle.radius.set(1.5);
        assert_eq!(circle.diameter().map(|d| *d), Ok(3.0));

        circle.radius.set(-1.0);
        assert_eq!(circle.diameter().map(|d| *d), Ok(3.0));
    }

    #[test]
    #[allow(deprecated)]
    fn deprecated_properties_still_cache() {
        let circle = Circle::new(1.0);
        assert_eq!(*circle.width(), 2.0);
        assert!(Circle::WIDTH.is_cached(&circle));
        assert_eq!(Circle::WIDTH.source(), "width");
    }

    #[derive(HasAttributes)]
    struct Labelled<T> {
        value: T,
        #[attributes]
        cache: AttributeTable,
    }

    impl<T: Display> Labelled<T> {
        #[cached_property]
        pub fn label(&self) -> String {
            format!("<{}>", self.value)
        }
    }

    #[test]
    fn generic_owners() {
        let labelled = Labelled {
            value: 7,
            cache: AttributeTable::new(),
        };
        assert_eq!(*labelled.label(), "<7>");
        assert_eq!(Labelled::<i32>::LABEL.get(&labelled), "<7>");
        assert!(Rc::ptr_eq(&labelled.label(), &labelled.label()));
    }
}
