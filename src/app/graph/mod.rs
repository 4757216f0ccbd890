mod build;
mod interaction;
mod view;
