pub mod avatar;
pub mod guard;
pub mod html;
pub mod photo;
