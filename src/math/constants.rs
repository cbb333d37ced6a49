/* Copyright 2020 @Yuchen Wong */

pub type Float = f32;
pub type UInt = u32;

pub type Vector2f = nalgebra::Vector2<Float>;
pub type Vector4f = nalgebra::Vector4<Float>;
