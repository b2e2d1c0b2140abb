//! Element and side shapes supported by the cutting engine.

pub use self::cell_type::CellType;
pub use self::reference::{
    interpolate, interpolate_gradient, local_coordinates, shape_gradients, shape_values,
};

mod cell_type;
mod reference;
