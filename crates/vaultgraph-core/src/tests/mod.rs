mod inspect;
mod model;
