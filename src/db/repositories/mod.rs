mod overtime;
mod persons;
