//! Parameter Sets

use crate::geometry::*;
use crate::pbrt::*;
use crate::spectrum::*;
use std::collections::HashMap;

/// A named parameter value list.
#[derive(Clone, Debug)]
pub struct ParamSetItem<T> {
    /// The values.
    pub values: Vec<T>,
}

impl<T> ParamSetItem<T> {
    /// Create a new `ParamSetItem`.
    ///
    /// * `values` - The values.
    pub fn new(values: Vec<T>) -> Self {
        Self { values }
    }
}

/// A hashmap of parameter set items stored by name.
pub type ParamSetMap<T> = HashMap<String, ParamSetItem<T>>;

/// Stores construction-time options of lights and integrators.
#[derive(Clone, Default, Debug)]
pub struct ParamSet {
    pub bools: ParamSetMap<bool>,
    pub ints: ParamSetMap<Int>,
    pub floats: ParamSetMap<Float>,
    pub point3fs: ParamSetMap<Point3f>,
    pub spectra: ParamSetMap<Spectrum>,
    pub strings: ParamSetMap<String>,
}

/// Define a macro that can be used to generate a function for adding/replacing
/// parameter set item.
macro_rules! paramset_add {
    ($func: ident, $t: ty, $paramset: ident) => {
        pub fn $func(&mut self, name: &str, values: &[$t]) {
            self.$paramset.insert(String::from(name), ParamSetItem::new(values.to_vec()));
        }
    };
}

/// Define a macro that can be used to generate a function for finding
/// parameter set item that is stored as a single item.
macro_rules! paramset_find_one {
    ($func: ident, $t: ty, $paramset: ident) => {
        pub fn $func(&self, name: &str, default: $t) -> $t {
            match self.$paramset.get(name) {
                Some(param) if param.values.len() == 1 => param.values[0].clone(),
                Some(_) => {
                    warn!("Parameter '{name}' expects a single value; using default.");
                    default
                }
                None => default,
            }
        }
    };
}

impl ParamSet {
    /// Returns a new empty `ParamSet`.
    pub fn new() -> Self {
        Self::default()
    }

    paramset_add!(add_bool, bool, bools);
    paramset_find_one!(find_one_bool, bool, bools);

    paramset_add!(add_int, Int, ints);
    paramset_find_one!(find_one_int, Int, ints);

    paramset_add!(add_float, Float, floats);
    paramset_find_one!(find_one_float, Float, floats);

    paramset_add!(add_point3f, Point3f, point3fs);
    paramset_find_one!(find_one_point3f, Point3f, point3fs);

    paramset_add!(add_spectrum, Spectrum, spectra);
    paramset_find_one!(find_one_spectrum, Spectrum, spectra);

    paramset_add!(add_string, String, strings);
    paramset_find_one!(find_one_string, String, strings);

    /// Convenience for adding a single string value.
    ///
    /// * `name`  - Parameter name.
    /// * `value` - The value.
    pub fn add_str(&mut self, name: &str, value: &str) {
        self.add_string(name, &[String::from(value)]);
    }
}
