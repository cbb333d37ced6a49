// Copyright 2020 @TwoCookingMice

pub mod constants;
pub mod cubic;
pub mod spectrum;
