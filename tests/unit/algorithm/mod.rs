mod assignment;
mod mask;
